//! CORS policy evaluation.
//!
//! # Responsibilities
//! - Compile the default and named CORS policies from config into `CorsLayer`s
//! - Pick the layer a route's binding asks for
//! - Answer preflights on `Disabled` routes
//!
//! # Design Decisions
//! - Requests without an `Origin` header skip CORS entirely
//! - `Disabled` routes answer preflights with a bare 204
//! - `*` is never combined with credentials; the request is mirrored instead

use std::collections::HashMap;
use std::time::Duration;

use axum::body::Body;
use axum::http::header::{self, HeaderName, HeaderValue};
use axum::http::{Method, Request, Response, StatusCode};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer, ExposeHeaders};

use crate::config::{CorsConfig, CorsPolicyConfig};
use crate::routing::matcher::is_cors_preflight;
use crate::routing::policy::CorsPolicy;

fn is_wildcard(values: &[String]) -> bool {
    values.iter().any(|v| v.trim() == "*")
}

/// Build the tower-http layer for one configured policy.
pub fn cors_layer(config: &CorsPolicyConfig) -> CorsLayer {
    let credentials = config.allow_credentials;

    let origins = match (is_wildcard(&config.allowed_origins), credentials) {
        (true, true) => AllowOrigin::mirror_request(),
        (true, false) => AllowOrigin::any(),
        (false, _) => AllowOrigin::list(
            config
                .allowed_origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o.trim().trim_end_matches('/')).ok()),
        ),
    };

    let methods = match (is_wildcard(&config.allowed_methods), credentials) {
        (true, true) => AllowMethods::mirror_request(),
        (true, false) => AllowMethods::any(),
        (false, _) => AllowMethods::list(
            config
                .allowed_methods
                .iter()
                .filter_map(|m| Method::from_bytes(m.trim().to_ascii_uppercase().as_bytes()).ok()),
        ),
    };

    let headers = match (is_wildcard(&config.allowed_headers), credentials) {
        (true, true) => AllowHeaders::mirror_request(),
        (true, false) => AllowHeaders::any(),
        (false, _) => AllowHeaders::list(header_names(&config.allowed_headers)),
    };

    let exposed = if is_wildcard(&config.exposed_headers) && !credentials {
        ExposeHeaders::any()
    } else {
        ExposeHeaders::list(header_names(&config.exposed_headers))
    };

    let layer = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers(headers)
        .expose_headers(exposed)
        .allow_credentials(credentials);

    match config.max_age_secs {
        Some(secs) => layer.max_age(Duration::from_secs(secs)),
        None => layer,
    }
}

fn header_names(values: &[String]) -> Vec<HeaderName> {
    values
        .iter()
        .map(|v| v.trim())
        .filter(|v| *v != "*")
        .filter_map(|v| HeaderName::from_bytes(v.as_bytes()).ok())
        .collect()
}

/// What the pipeline does about CORS for one request.
#[derive(Debug)]
pub enum CorsOutcome<'a> {
    /// No CORS handling applies.
    Skip,
    /// Answer directly with this response.
    Preflight(Response<Body>),
    /// Run the rest of the pipeline inside this layer.
    Apply(&'a CorsLayer),
}

/// The default and named CORS policies.
#[derive(Debug, Clone)]
pub struct CorsPolicies {
    default: CorsLayer,
    named: HashMap<String, CorsLayer>,
}

impl CorsPolicies {
    pub fn from_config(config: &CorsConfig) -> Self {
        Self {
            default: cors_layer(&config.default_policy),
            named: config
                .policies
                .iter()
                .map(|p| (p.name.clone(), cors_layer(&p.policy)))
                .collect(),
        }
    }

    /// Resolve the route's CORS binding. Errors with the policy name when a
    /// named policy is not registered.
    pub fn resolve(&self, binding: &CorsPolicy, req: &Request<Body>) -> Result<CorsOutcome<'_>, String> {
        if !req.headers().contains_key(header::ORIGIN) {
            return Ok(CorsOutcome::Skip);
        }
        match binding {
            CorsPolicy::Absent => Ok(CorsOutcome::Skip),
            CorsPolicy::Disabled if is_cors_preflight(req) => {
                let mut response = Response::new(Body::empty());
                *response.status_mut() = StatusCode::NO_CONTENT;
                Ok(CorsOutcome::Preflight(response))
            }
            CorsPolicy::Disabled => Ok(CorsOutcome::Skip),
            CorsPolicy::Default => Ok(CorsOutcome::Apply(&self.default)),
            CorsPolicy::Named(name) => self
                .named
                .get(name)
                .map(CorsOutcome::Apply)
                .ok_or_else(|| name.clone()),
        }
    }
}
