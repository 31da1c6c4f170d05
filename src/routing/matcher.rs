//! Dispatch entry constraints.
//!
//! # Responsibilities
//! - Match the request host against a host list
//! - Match the request method against a method set
//! - Recognise CORS preflight requests
//!
//! # Design Decisions
//! - Host matching is case-insensitive (RFC 9110)
//! - A host entry without a port matches any port
//! - `*.example.com` matches any subdomain of example.com, not the apex
//! - No constraint attached = always matches (wildcard)

use axum::body::Body;
use axum::http::{header, Method, Request};
use std::collections::HashSet;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request<Body>) -> bool;
}

/// True for a browser CORS preflight: `OPTIONS` carrying both `Origin`
/// and `Access-Control-Request-Method`.
pub fn is_cors_preflight<B>(req: &Request<B>) -> bool {
    req.method() == Method::OPTIONS
        && req.headers().contains_key(header::ORIGIN)
        && req
            .headers()
            .contains_key(header::ACCESS_CONTROL_REQUEST_METHOD)
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HostPattern {
    host: String,
    wildcard: bool,
    port: Option<u16>,
}

impl HostPattern {
    fn parse(raw: &str) -> Self {
        let raw = raw.trim().to_ascii_lowercase();
        let (host, port) = split_host_port(&raw);
        match host.strip_prefix("*.") {
            Some(suffix) => Self {
                host: suffix.to_string(),
                wildcard: true,
                port,
            },
            None => Self {
                host: host.to_string(),
                wildcard: false,
                port,
            },
        }
    }

    fn matches(&self, host: &str, port: Option<u16>) -> bool {
        if let Some(expected) = self.port {
            if port != Some(expected) {
                return false;
            }
        }
        if self.wildcard {
            host.len() > self.host.len() + 1
                && host.ends_with(&self.host)
                && host.as_bytes()[host.len() - self.host.len() - 1] == b'.'
        } else {
            host == self.host
        }
    }
}

/// Restricts a dispatch entry to a set of hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostConstraint {
    hosts: Vec<HostPattern>,
}

impl HostConstraint {
    /// Create a host constraint. Hosts are normalized to lowercase.
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            hosts: hosts
                .into_iter()
                .map(|h| HostPattern::parse(h.as_ref()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    /// Match a raw `host[:port]` value.
    pub fn matches_host(&self, raw: &str) -> bool {
        let raw = raw.to_ascii_lowercase();
        let (host, port) = split_host_port(&raw);
        self.hosts.iter().any(|p| p.matches(host, port))
    }
}

impl Matcher for HostConstraint {
    fn matches(&self, req: &Request<Body>) -> bool {
        request_host(req)
            .map(|h| self.matches_host(&h))
            .unwrap_or(false)
    }
}

/// Restricts a dispatch entry to a set of HTTP methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodConstraint {
    methods: HashSet<Method>,
    accept_cors_preflight: bool,
}

impl MethodConstraint {
    pub fn new(methods: HashSet<Method>, accept_cors_preflight: bool) -> Self {
        Self {
            methods,
            accept_cors_preflight,
        }
    }

    pub fn methods(&self) -> &HashSet<Method> {
        &self.methods
    }

    /// Whether preflight requests match even if `OPTIONS` is not listed.
    pub fn accepts_cors_preflight(&self) -> bool {
        self.accept_cors_preflight
    }
}

impl Matcher for MethodConstraint {
    fn matches(&self, req: &Request<Body>) -> bool {
        if self.methods.contains(req.method()) {
            return true;
        }
        self.accept_cors_preflight && is_cors_preflight(req)
    }
}

/// Host of the request, from the `Host` header or the URI authority.
pub fn request_host<B>(req: &Request<B>) -> Option<String> {
    req.headers()
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(|a| a.as_str().to_string()))
}

fn split_host_port(raw: &str) -> (&str, Option<u16>) {
    // IPv6 literals keep their brackets; the port follows the closing one.
    if raw.starts_with('[') {
        if let Some(end) = raw.find(']') {
            let port = raw[end + 1..]
                .strip_prefix(':')
                .and_then(|p| p.parse().ok());
            return (&raw[..=end], port);
        }
    }
    match raw.rsplit_once(':') {
        Some((host, port)) => match port.parse() {
            Ok(port) => (host, Some(port)),
            Err(_) => (raw, None),
        },
        None => (raw, None),
    }
}
