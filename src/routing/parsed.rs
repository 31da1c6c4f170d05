//! Route builder inputs: the parsed route and its long-lived identity.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use arc_swap::ArcSwapAny;

use crate::config::RouteConfig;
use crate::routing::dispatch::RouteRuntimeConfig;
use crate::transforms::TransformSpec;

/// Comparable token identifying one revision of a route's configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigHash(pub u64);

impl ConfigHash {
    /// Hash the serialized form of a route configuration.
    pub fn of(config: &RouteConfig) -> Self {
        let mut hasher = DefaultHasher::new();
        // Serialization of the schema types cannot fail; fall back to Debug just in case.
        match serde_json::to_string(config) {
            Ok(json) => json.hash(&mut hasher),
            Err(_) => format!("{:?}", config).hash(&mut hasher),
        }
        Self(hasher.finish())
    }
}

impl std::fmt::Display for ConfigHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A validated, immutable route definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRoute {
    pub route_id: String,
    pub path: String,
    pub hosts: Vec<String>,
    pub methods: Vec<String>,
    pub cors_policy: String,
    pub authorization_policy: String,
    pub transforms: Vec<TransformSpec>,
    pub priority: i32,
    pub cluster_id: Option<String>,
    pub config_hash: ConfigHash,
}

impl ParsedRoute {
    /// A route with the given id and everything else empty.
    pub fn new(route_id: impl Into<String>) -> Self {
        Self {
            route_id: route_id.into(),
            path: String::new(),
            hosts: Vec::new(),
            methods: Vec::new(),
            cors_policy: String::new(),
            authorization_policy: String::new(),
            transforms: Vec::new(),
            priority: 0,
            cluster_id: None,
            config_hash: ConfigHash(0),
        }
    }
}

impl From<&RouteConfig> for ParsedRoute {
    fn from(config: &RouteConfig) -> Self {
        Self {
            route_id: config.route_id.clone(),
            path: config.path.clone(),
            hosts: config.hosts.clone(),
            methods: config.methods.clone(),
            cors_policy: config.cors_policy.clone(),
            authorization_policy: config.authorization_policy.clone(),
            transforms: config.transforms.clone(),
            priority: config.priority,
            cluster_id: config.cluster_id.clone(),
            config_hash: ConfigHash::of(config),
        }
    }
}

/// Long-lived identity of a route, stable across configuration reloads.
///
/// Points weakly at the currently published runtime model. The model owns
/// this identity, so ownership only ever flows model → identity.
pub struct RouteInfo {
    route_id: String,
    model: ArcSwapAny<Weak<RouteRuntimeConfig>>,
    revision: AtomicU64,
}

impl RouteInfo {
    pub fn new(route_id: impl Into<String>) -> Self {
        Self {
            route_id: route_id.into(),
            model: ArcSwapAny::new(Weak::new()),
            revision: AtomicU64::new(0),
        }
    }

    pub fn route_id(&self) -> &str {
        &self.route_id
    }

    /// The currently published runtime model, if it is still alive.
    pub fn model(&self) -> Option<Arc<RouteRuntimeConfig>> {
        self.model.load().upgrade()
    }

    /// Publish a new runtime model for this route.
    pub fn publish(&self, model: &Arc<RouteRuntimeConfig>) {
        self.model.store(Arc::downgrade(model));
        self.revision.fetch_add(1, Ordering::Relaxed);
    }

    /// Forget the published model.
    pub fn clear(&self) {
        self.model.store(Weak::new());
    }

    /// Number of models published so far.
    pub fn revision(&self) -> u64 {
        self.revision.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for RouteInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouteInfo")
            .field("route_id", &self.route_id)
            .field("revision", &self.revision())
            .finish()
    }
}
