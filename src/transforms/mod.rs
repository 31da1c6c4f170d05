//! Request and response transforms.
//!
//! # Data Flow
//! ```text
//! TransformSpec[] (config)
//!     → TransformBuilder::build (validate, pre-parse headers)
//!     → TransformChain (stored on the runtime route)
//!     → applied by the proxy pipeline to each forwarded request/response
//! ```
//!
//! # Design Decisions
//! - Header names and values are parsed once at build time
//! - Transforms run in configured order
//! - Path transforms never touch the query string

pub mod builder;

pub use builder::StandardTransformBuilder;

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};
use axum::http::request::Parts;
use axum::http::uri::{PathAndQuery, Uri};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Declarative transform as written in route configuration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformSpec {
    /// Replace the request path.
    PathSet { path: String },
    /// Prepend a prefix to the request path.
    PathPrefix { prefix: String },
    /// Strip a prefix from the request path if present.
    PathRemovePrefix { prefix: String },
    /// Set (or append) a request header.
    RequestHeader {
        name: String,
        value: String,
        #[serde(default)]
        append: bool,
    },
    /// Remove a request header.
    RequestHeaderRemove { name: String },
    /// Set (or append) a response header.
    ResponseHeader {
        name: String,
        value: String,
        #[serde(default)]
        append: bool,
    },
}

/// Errors produced while building a transform chain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransformError {
    #[error("invalid header name '{0}'")]
    InvalidHeaderName(String),

    #[error("invalid value for header '{0}'")]
    InvalidHeaderValue(String),

    #[error("path '{0}' must start with '/'")]
    InvalidPath(String),
}

/// Turns declarative transform specs into an executable chain.
pub trait TransformBuilder: Send + Sync {
    fn build(&self, specs: &[TransformSpec]) -> Result<TransformChain, TransformError>;
}

/// A single compiled request transform.
#[derive(Debug, Clone)]
pub enum RequestTransform {
    PathSet(String),
    PathPrefix(String),
    PathRemovePrefix(String),
    SetHeader(HeaderName, HeaderValue),
    AppendHeader(HeaderName, HeaderValue),
    RemoveHeader(HeaderName),
}

/// A single compiled response transform.
#[derive(Debug, Clone)]
pub enum ResponseTransform {
    SetHeader(HeaderName, HeaderValue),
    AppendHeader(HeaderName, HeaderValue),
}

/// Ordered transforms attached to a runtime route.
#[derive(Debug, Clone, Default)]
pub struct TransformChain {
    request: Vec<RequestTransform>,
    response: Vec<ResponseTransform>,
}

impl TransformChain {
    pub fn new(request: Vec<RequestTransform>, response: Vec<ResponseTransform>) -> Self {
        Self { request, response }
    }

    pub fn is_empty(&self) -> bool {
        self.request.is_empty() && self.response.is_empty()
    }

    pub fn request_transforms(&self) -> &[RequestTransform] {
        &self.request
    }

    pub fn response_transforms(&self) -> &[ResponseTransform] {
        &self.response
    }

    /// Apply request transforms to the outgoing request parts.
    pub fn apply_request(&self, parts: &mut Parts) {
        for transform in &self.request {
            match transform {
                RequestTransform::PathSet(path) => set_path(&mut parts.uri, path.clone()),
                RequestTransform::PathPrefix(prefix) => {
                    let path = join_paths(prefix, parts.uri.path());
                    set_path(&mut parts.uri, path);
                }
                RequestTransform::PathRemovePrefix(prefix) => {
                    if let Some(rest) = strip_path_prefix(parts.uri.path(), prefix) {
                        set_path(&mut parts.uri, rest);
                    }
                }
                RequestTransform::SetHeader(name, value) => {
                    parts.headers.insert(name.clone(), value.clone());
                }
                RequestTransform::AppendHeader(name, value) => {
                    parts.headers.append(name.clone(), value.clone());
                }
                RequestTransform::RemoveHeader(name) => {
                    parts.headers.remove(name);
                }
            }
        }
    }

    /// Apply response transforms to the headers returned to the client.
    pub fn apply_response(&self, headers: &mut HeaderMap) {
        for transform in &self.response {
            match transform {
                ResponseTransform::SetHeader(name, value) => {
                    headers.insert(name.clone(), value.clone());
                }
                ResponseTransform::AppendHeader(name, value) => {
                    headers.append(name.clone(), value.clone());
                }
            }
        }
    }
}

fn join_paths(prefix: &str, path: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    if path == "/" || path.is_empty() {
        return if prefix.is_empty() { "/".to_string() } else { prefix.to_string() };
    }
    format!("{}{}", prefix, path)
}

/// Strip `prefix` on a segment boundary. `/api` strips from `/api/x` and `/api`
/// but not from `/apix`.
fn strip_path_prefix(path: &str, prefix: &str) -> Option<String> {
    let prefix = prefix.trim_end_matches('/');
    let rest = path.strip_prefix(prefix)?;
    if rest.is_empty() {
        Some("/".to_string())
    } else if rest.starts_with('/') {
        Some(rest.to_string())
    } else {
        None
    }
}

fn set_path(uri: &mut Uri, path: String) {
    let path_and_query = match uri.query() {
        Some(query) => format!("{}?{}", path, query),
        None => path,
    };
    let Ok(path_and_query) = path_and_query.parse::<PathAndQuery>() else {
        tracing::warn!(path = %path_and_query, "Transformed path is not a valid URI path; keeping original");
        return;
    };
    let mut parts = uri.clone().into_parts();
    parts.path_and_query = Some(path_and_query);
    if let Ok(updated) = Uri::from_parts(parts) {
        *uri = updated;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(uri: &str) -> Parts {
        Request::builder().uri(uri).body(()).unwrap().into_parts().0
    }

    fn chain(specs: &[TransformSpec]) -> TransformChain {
        StandardTransformBuilder::new().build(specs).unwrap()
    }

    #[test]
    fn test_path_transforms_keep_query() {
        let chain = chain(&[
            TransformSpec::PathRemovePrefix { prefix: "/api".into() },
            TransformSpec::PathPrefix { prefix: "/v2".into() },
        ]);
        let mut p = parts("/api/users?page=2");
        chain.apply_request(&mut p);
        assert_eq!(p.uri.path(), "/v2/users");
        assert_eq!(p.uri.query(), Some("page=2"));
    }

    #[test]
    fn test_remove_prefix_respects_segments() {
        let chain = chain(&[TransformSpec::PathRemovePrefix { prefix: "/api".into() }]);

        let mut p = parts("/apix/users");
        chain.apply_request(&mut p);
        assert_eq!(p.uri.path(), "/apix/users");

        let mut p = parts("/api");
        chain.apply_request(&mut p);
        assert_eq!(p.uri.path(), "/");
    }

    #[test]
    fn test_path_set() {
        let chain = chain(&[TransformSpec::PathSet { path: "/health".into() }]);
        let mut p = parts("/anything/else");
        chain.apply_request(&mut p);
        assert_eq!(p.uri.path(), "/health");
    }

    #[test]
    fn test_header_transforms() {
        let chain = chain(&[
            TransformSpec::RequestHeader {
                name: "x-forwarded-by".into(),
                value: "routegate".into(),
                append: false,
            },
            TransformSpec::RequestHeaderRemove { name: "cookie".into() },
            TransformSpec::ResponseHeader {
                name: "x-served-by".into(),
                value: "routegate".into(),
                append: true,
            },
        ]);

        let mut p = parts("/");
        p.headers.insert("cookie", HeaderValue::from_static("session=1"));
        chain.apply_request(&mut p);
        assert_eq!(p.headers.get("x-forwarded-by").unwrap(), "routegate");
        assert!(p.headers.get("cookie").is_none());

        let mut headers = HeaderMap::new();
        headers.insert("x-served-by", HeaderValue::from_static("backend"));
        chain.apply_response(&mut headers);
        assert_eq!(headers.get_all("x-served-by").iter().count(), 2);
    }

    #[test]
    fn test_spec_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            transforms: Vec<TransformSpec>,
        }
        let parsed: Wrapper = toml::from_str(
            r#"
            [[transforms]]
            type = "path_prefix"
            prefix = "/v2"

            [[transforms]]
            type = "request_header"
            name = "x-api"
            value = "1"
            "#,
        )
        .unwrap();
        assert_eq!(
            parsed.transforms,
            vec![
                TransformSpec::PathPrefix { prefix: "/v2".into() },
                TransformSpec::RequestHeader {
                    name: "x-api".into(),
                    value: "1".into(),
                    append: false
                },
            ]
        );
    }
}
