//! Authorization policy enforcement.
//! Checks the `Authorization` header against the route's binding.

use std::collections::{HashMap, HashSet};

use axum::http::header::{self, HeaderMap};

use crate::config::AuthorizationConfig;
use crate::routing::policy::AuthorizationPolicy;

/// Outcome of an authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationOutcome {
    Allowed,
    /// No usable credentials (401).
    Unauthenticated,
    /// Credentials present but not accepted (403).
    Forbidden,
    /// The route names a policy that is not registered.
    UnknownPolicy(String),
}

/// Registered authorization policies.
#[derive(Debug, Clone, Default)]
pub struct AuthorizationPolicies {
    named: HashMap<String, HashSet<String>>,
}

impl AuthorizationPolicies {
    pub fn from_config(config: &AuthorizationConfig) -> Self {
        Self {
            named: config
                .policies
                .iter()
                .map(|p| (p.name.clone(), p.bearer_tokens.iter().cloned().collect()))
                .collect(),
        }
    }

    /// Check request headers against a route binding.
    pub fn authorize(&self, binding: &AuthorizationPolicy, headers: &HeaderMap) -> AuthorizationOutcome {
        let credentials = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty());

        match binding {
            AuthorizationPolicy::Absent => AuthorizationOutcome::Allowed,
            AuthorizationPolicy::Default => match credentials {
                Some(_) => AuthorizationOutcome::Allowed,
                None => AuthorizationOutcome::Unauthenticated,
            },
            AuthorizationPolicy::Named(name) => {
                let Some(tokens) = self.named.get(name) else {
                    return AuthorizationOutcome::UnknownPolicy(name.clone());
                };
                let Some(credentials) = credentials else {
                    return AuthorizationOutcome::Unauthenticated;
                };
                match bearer_token(credentials) {
                    Some(token) if tokens.contains(token) => AuthorizationOutcome::Allowed,
                    _ => AuthorizationOutcome::Forbidden,
                }
            }
        }
    }
}

fn bearer_token(credentials: &str) -> Option<&str> {
    let (scheme, token) = credentials.split_once(' ')?;
    scheme
        .eq_ignore_ascii_case("bearer")
        .then(|| token.trim())
}
