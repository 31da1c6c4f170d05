//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::transforms::TransformSpec;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Route definitions mapping requests to clusters.
    pub routes: Vec<RouteConfig>,

    /// Backend cluster definitions.
    pub clusters: Vec<ClusterConfig>,

    /// CORS policies referenced by routes.
    pub cors: CorsConfig,

    /// Authorization policies referenced by routes.
    pub authorization: AuthorizationConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Route configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct RouteConfig {
    /// Unique route identifier, used for logging/metrics.
    pub route_id: String,

    /// Path pattern, e.g. `/api/{**rest}`. Empty matches every path.
    pub path: String,

    /// Hosts to match. Empty matches any host.
    pub hosts: Vec<String>,

    /// HTTP methods to match. Empty matches any method.
    pub methods: Vec<String>,

    /// `default`, `disable`, a named policy, or empty for none.
    pub cors_policy: String,

    /// `default`, a named policy, or empty for an open route.
    pub authorization_policy: String,

    /// Transforms applied to forwarded requests and responses.
    pub transforms: Vec<TransformSpec>,

    /// Route priority (higher = checked first).
    pub priority: i32,

    /// Cluster to forward to. A route without a cluster answers 503.
    pub cluster_id: Option<String>,
}

/// Backend cluster configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct ClusterConfig {
    /// Unique cluster identifier.
    pub cluster_id: String,

    /// Destinations requests are balanced across.
    pub destinations: Vec<DestinationConfig>,
}

/// A single cluster destination.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct DestinationConfig {
    /// Destination name for logging/metrics.
    pub name: String,

    /// Destination base URL (e.g., "http://127.0.0.1:3000").
    pub address: String,
}

/// CORS policy registry.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct CorsConfig {
    /// Policy used by routes with `cors_policy = "default"`.
    pub default_policy: CorsPolicyConfig,

    /// Named policies.
    pub policies: Vec<NamedCorsPolicy>,
}

/// A named CORS policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct NamedCorsPolicy {
    pub name: String,

    #[serde(flatten)]
    pub policy: CorsPolicyConfig,
}

/// Rules of a single CORS policy.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CorsPolicyConfig {
    /// Allowed origins. `*` allows any origin.
    pub allowed_origins: Vec<String>,

    /// Allowed methods for preflight. `*` allows any method.
    pub allowed_methods: Vec<String>,

    /// Allowed request headers for preflight. `*` allows any header.
    pub allowed_headers: Vec<String>,

    /// Response headers exposed to the browser.
    pub exposed_headers: Vec<String>,

    /// Send `Access-Control-Allow-Credentials: true`.
    pub allow_credentials: bool,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: Option<u64>,
}

impl Default for CorsPolicyConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec!["*".to_string()],
            allowed_headers: vec!["*".to_string()],
            exposed_headers: Vec::new(),
            allow_credentials: false,
            max_age_secs: None,
        }
    }
}

/// Authorization policy registry.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AuthorizationConfig {
    /// Named policies.
    pub policies: Vec<AuthorizationPolicyConfig>,
}

/// A named authorization policy: a list of accepted bearer tokens.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct AuthorizationPolicyConfig {
    pub name: String,

    /// Tokens accepted in `Authorization: Bearer <token>`.
    #[serde(default)]
    pub bearer_tokens: Vec<String>,
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream request timeout in seconds.
    pub upstream_secs: u64,

    /// Total request timeout (client side) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            upstream_secs: 30,
            request_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
