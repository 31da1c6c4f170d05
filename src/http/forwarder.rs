//! Request pipeline: everything that happens after a route matched.
//!
//! # Responsibilities
//! - Apply the entry's CORS and authorization bindings
//! - Run the route's request and response transforms
//! - Pick a destination from the route's cluster and forward upstream
//! - Record request metrics
//!
//! # Design Decisions
//! - The dispatch handler stores the `MatchedRoute` in request extensions
//! - CORS runs as a tower-http layer around authorization and forwarding
//! - Preflight requests never reach authorization or the upstream
//! - One upstream attempt per request, bounded by the upstream timeout

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, Response, StatusCode, Version},
    response::IntoResponse,
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use tower::{service_fn, Layer, ServiceExt};

use crate::config::ProxyConfig;
use crate::http::request::request_id;
use crate::observability::metrics;
use crate::routing::matcher::request_host;
use crate::routing::{MatchedRoute, RouteRuntimeConfig};
use crate::security::headers::{add_forwarded_headers, strip_hop_by_hop};
use crate::security::{AuthorizationOutcome, AuthorizationPolicies, CorsOutcome, CorsPolicies};

/// The proxy's request pipeline. Cheap to clone.
#[derive(Clone)]
pub struct ProxyPipeline {
    inner: Arc<PipelineInner>,
}

struct PipelineInner {
    client: Client<HttpConnector, Body>,
    cors: CorsPolicies,
    authorization: AuthorizationPolicies,
    upstream_timeout: Duration,
}

impl ProxyPipeline {
    pub fn new(config: &ProxyConfig) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            inner: Arc::new(PipelineInner {
                client,
                cors: CorsPolicies::from_config(&config.cors),
                authorization: AuthorizationPolicies::from_config(&config.authorization),
                upstream_timeout: Duration::from_secs(config.timeouts.upstream_secs),
            }),
        }
    }

    /// Handle one matched request end to end.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let start = Instant::now();
        let method = request.method().to_string();
        let request_id = request_id(&request).to_string();

        let Some(matched) = request.extensions().get::<MatchedRoute>().cloned() else {
            tracing::error!(request_id = %request_id, "Pipeline invoked without a matched route");
            metrics::record_request(&method, 500, "none", start);
            return (StatusCode::INTERNAL_SERVER_ERROR, "No route context").into_response();
        };
        let route_id = matched.route().route_id().to_string();

        tracing::debug!(
            request_id = %request_id,
            route_id = %route_id,
            entry = %matched.entry().display_name(),
            "Handling matched request"
        );

        let response = match self.inner.cors.resolve(matched.entry().cors(), &request) {
            Ok(CorsOutcome::Skip) => self.authorize_and_forward(&matched, request, &request_id).await,
            Ok(CorsOutcome::Preflight(response)) => response,
            Ok(CorsOutcome::Apply(layer)) => {
                let this = self.clone();
                let rid = request_id.clone();
                let inner = service_fn(move |request: Request<Body>| {
                    let this = this.clone();
                    let matched = matched.clone();
                    let rid = rid.clone();
                    async move { Ok::<_, Infallible>(this.authorize_and_forward(&matched, request, &rid).await) }
                });
                match layer.layer(inner).oneshot(request).await {
                    Ok(response) => response,
                    Err(never) => match never {},
                }
            }
            Err(policy) => {
                tracing::error!(request_id = %request_id, route_id = %route_id, policy = %policy, "Unknown CORS policy");
                (StatusCode::INTERNAL_SERVER_ERROR, "Unknown CORS policy").into_response()
            }
        };

        metrics::record_request(&method, response.status().as_u16(), &route_id, start);
        response
    }

    /// Authorization, forwarding and response transforms.
    async fn authorize_and_forward(&self, matched: &MatchedRoute, request: Request<Body>, request_id: &str) -> Response<Body> {
        let route = matched.route();
        let route_id = route.route_id();

        let denied = match self
            .inner
            .authorization
            .authorize(matched.entry().authorization(), request.headers())
        {
            AuthorizationOutcome::Allowed => None,
            AuthorizationOutcome::Unauthenticated => Some((StatusCode::UNAUTHORIZED, "Unauthorized")),
            AuthorizationOutcome::Forbidden => Some((StatusCode::FORBIDDEN, "Forbidden")),
            AuthorizationOutcome::UnknownPolicy(policy) => {
                tracing::error!(request_id = %request_id, route_id = %route_id, policy = %policy, "Unknown authorization policy");
                Some((StatusCode::INTERNAL_SERVER_ERROR, "Unknown authorization policy"))
            }
        };
        if let Some((status, message)) = denied {
            tracing::warn!(request_id = %request_id, route_id = %route_id, status = %status, "Request rejected by authorization");
            return (status, message).into_response();
        }

        let mut response = self.forward(route, request, request_id).await;
        route.transforms().apply_response(response.headers_mut());
        response
    }

    async fn forward(&self, route: &RouteRuntimeConfig, request: Request<Body>, request_id: &str) -> Response<Body> {
        let Some(cluster) = route.cluster() else {
            tracing::warn!(request_id = %request_id, route_id = %route.route_id(), "Route has no cluster");
            return (StatusCode::SERVICE_UNAVAILABLE, "Route has no cluster").into_response();
        };
        let Some(destination) = cluster.select() else {
            tracing::warn!(request_id = %request_id, cluster = %cluster.cluster_id(), "No destinations available");
            return (StatusCode::SERVICE_UNAVAILABLE, "No destinations available").into_response();
        };

        let client_ip = request
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip());
        let original_host = request_host(&request);

        let (mut parts, body) = request.into_parts();
        route.transforms().apply_request(&mut parts);
        strip_hop_by_hop(&mut parts.headers);
        add_forwarded_headers(&mut parts.headers, client_ip, original_host.as_deref());
        parts.headers.remove(header::HOST);

        let path_and_query = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        let target = format!(
            "http://{}{}{}",
            destination.authority(),
            destination.base_path(),
            path_and_query
        );
        parts.uri = match target.parse() {
            Ok(uri) => uri,
            Err(e) => {
                tracing::error!(request_id = %request_id, target = %target, error = %e, "Invalid upstream URI");
                return (StatusCode::BAD_GATEWAY, "Invalid upstream URI").into_response();
            }
        };
        parts.version = Version::HTTP_11;

        tracing::debug!(
            request_id = %request_id,
            destination = %destination.name(),
            uri = %parts.uri,
            "Forwarding request"
        );

        let upstream = Request::from_parts(parts, body);
        match tokio::time::timeout(self.inner.upstream_timeout, self.inner.client.request(upstream)).await {
            Ok(Ok(response)) => {
                let (mut parts, body) = response.into_parts();
                strip_hop_by_hop(&mut parts.headers);
                Response::from_parts(parts, Body::new(body))
            }
            Ok(Err(e)) => {
                tracing::error!(request_id = %request_id, destination = %destination.name(), error = %e, "Upstream error");
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
            Err(_) => {
                tracing::warn!(request_id = %request_id, destination = %destination.name(), "Upstream timed out");
                (StatusCode::GATEWAY_TIMEOUT, "Upstream timed out").into_response()
            }
        }
    }
}

impl std::fmt::Debug for ProxyPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProxyPipeline")
            .field("upstream_timeout", &self.inner.upstream_timeout)
            .finish_non_exhaustive()
    }
}
