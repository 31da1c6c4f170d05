//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check referential integrity (routes reference existing clusters and policies)
//! - Validate route patterns, methods and destination addresses
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProxyConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;

use axum::http::Method;
use thiserror::Error;

use crate::cluster::destination::Destination;
use crate::config::schema::ProxyConfig;
use crate::routing::pattern::RoutePattern;
use crate::routing::policy::{AuthorizationPolicy, CorsPolicy};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("route at index {0} has an empty route_id")]
    EmptyRouteId(usize),

    #[error("duplicate route_id '{0}'")]
    DuplicateRoute(String),

    #[error("route '{route}' has invalid path: {reason}")]
    InvalidPath { route: String, reason: String },

    #[error("route '{route}' has invalid method '{method}'")]
    InvalidMethod { route: String, method: String },

    #[error("route '{route}' references unknown cluster '{cluster}'")]
    UnknownCluster { route: String, cluster: String },

    #[error("route '{route}' references unknown CORS policy '{policy}'")]
    UnknownCorsPolicy { route: String, policy: String },

    #[error("route '{route}' references unknown authorization policy '{policy}'")]
    UnknownAuthorizationPolicy { route: String, policy: String },

    #[error("cluster at index {0} has an empty cluster_id")]
    EmptyClusterId(usize),

    #[error("duplicate cluster_id '{0}'")]
    DuplicateCluster(String),

    #[error("cluster '{cluster}': {reason}")]
    InvalidDestination { cluster: String, reason: String },

    #[error("duplicate {kind} policy name '{name}'")]
    DuplicatePolicy { kind: &'static str, name: String },
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &ProxyConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let mut cluster_ids = HashSet::new();
    for (index, cluster) in config.clusters.iter().enumerate() {
        if cluster.cluster_id.is_empty() {
            errors.push(ValidationError::EmptyClusterId(index));
        } else if !cluster_ids.insert(cluster.cluster_id.as_str()) {
            errors.push(ValidationError::DuplicateCluster(cluster.cluster_id.clone()));
        }
        for destination in &cluster.destinations {
            if let Err(e) = Destination::parse(&destination.name, &destination.address) {
                errors.push(ValidationError::InvalidDestination {
                    cluster: cluster.cluster_id.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    let cors_names = policy_names(
        config.cors.policies.iter().map(|p| p.name.as_str()),
        "CORS",
        &mut errors,
    );
    let auth_names = policy_names(
        config.authorization.policies.iter().map(|p| p.name.as_str()),
        "authorization",
        &mut errors,
    );

    let mut route_ids = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.route_id.is_empty() {
            errors.push(ValidationError::EmptyRouteId(index));
        } else if !route_ids.insert(route.route_id.as_str()) {
            errors.push(ValidationError::DuplicateRoute(route.route_id.clone()));
        }

        if let Err(e) = RoutePattern::parse(&route.path) {
            errors.push(ValidationError::InvalidPath {
                route: route.route_id.clone(),
                reason: e.to_string(),
            });
        }

        for method in &route.methods {
            if Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes()).is_err() {
                errors.push(ValidationError::InvalidMethod {
                    route: route.route_id.clone(),
                    method: method.clone(),
                });
            }
        }

        if let Some(cluster) = &route.cluster_id {
            if !cluster_ids.contains(cluster.as_str()) {
                errors.push(ValidationError::UnknownCluster {
                    route: route.route_id.clone(),
                    cluster: cluster.clone(),
                });
            }
        }

        if let CorsPolicy::Named(name) = CorsPolicy::parse(&route.cors_policy) {
            if !cors_names.contains(name.as_str()) {
                errors.push(ValidationError::UnknownCorsPolicy {
                    route: route.route_id.clone(),
                    policy: name,
                });
            }
        }

        if let AuthorizationPolicy::Named(name) =
            AuthorizationPolicy::parse(&route.authorization_policy)
        {
            if !auth_names.contains(name.as_str()) {
                errors.push(ValidationError::UnknownAuthorizationPolicy {
                    route: route.route_id.clone(),
                    policy: name,
                });
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn policy_names<'a>(
    names: impl Iterator<Item = &'a str>,
    kind: &'static str,
    errors: &mut Vec<ValidationError>,
) -> HashSet<&'a str> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            errors.push(ValidationError::DuplicatePolicy {
                kind,
                name: name.to_string(),
            });
        }
    }
    seen
}
