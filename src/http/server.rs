//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the route table before any request is served
//! - Install the request pipeline, then start accepting traffic
//! - Wire up middleware (tracing, timeout, request ID)
//! - Dispatch requests to the matched entry's handler
//! - Apply configuration reloads by swapping the route table

use std::future::IntoFuture;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::{
    body::Body,
    extract::State,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ProxyConfig;
use crate::http::forwarder::ProxyPipeline;
use crate::http::request::{request_id, UuidRequestId};
use crate::observability::metrics;
use crate::routing::{CatalogError, RouteCatalog, RouteRuntimeBuilder, RouteTable};
use crate::transforms::StandardTransformBuilder;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub routes: Arc<ArcSwap<RouteTable>>,
}

/// HTTP server for the reverse proxy.
pub struct HttpServer {
    config: ProxyConfig,
    builder: RouteRuntimeBuilder,
    catalog: RouteCatalog,
    routes: Arc<ArcSwap<RouteTable>>,
}

impl HttpServer {
    /// Build every configured route. Entries defer to a pipeline that is
    /// installed later by [`HttpServer::install_pipeline`] or [`HttpServer::run`].
    pub fn new(config: ProxyConfig) -> Result<Self, CatalogError> {
        let builder = RouteRuntimeBuilder::new(Arc::new(StandardTransformBuilder::new()));
        let mut catalog = RouteCatalog::new();
        let (table, _) = catalog.apply(&config, &builder)?;

        Ok(Self {
            config,
            builder,
            catalog,
            routes: Arc::new(ArcSwap::from_pointee(table)),
        })
    }

    /// Install a pipeline built from the current configuration.
    pub fn install_pipeline(&self) {
        let pipeline = ProxyPipeline::new(&self.config);
        self.builder.set_pipeline(Arc::new(move |request: Request<Body>| {
            let pipeline = pipeline.clone();
            async move { pipeline.handle(request).await }
        }));
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    pub fn router(&self) -> Router {
        let state = AppState {
            routes: self.routes.clone(),
        };
        Router::new()
            .fallback(dispatch_handler)
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(self.config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
            .layer(TraceLayer::new_for_http())
    }

    /// Rebuild routes for a new configuration. On failure the current table stays.
    pub fn apply_config(&mut self, config: ProxyConfig) -> Result<(), CatalogError> {
        let (table, report) = self.catalog.apply(&config, &self.builder)?;
        self.config = config;
        self.install_pipeline();
        self.routes.store(Arc::new(table));
        tracing::info!(
            built = report.built,
            reused = report.reused,
            removed = report.removed,
            "Configuration applied"
        );
        Ok(())
    }

    /// Run the server, accepting connections on the given listener until
    /// `shutdown` fires. Reloaded configurations arrive on `config_updates`.
    pub async fn run(
        mut self,
        listener: TcpListener,
        mut config_updates: mpsc::UnboundedReceiver<ProxyConfig>,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        self.install_pipeline();

        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            routes = self.routes.load().len(),
            "HTTP server starting"
        );

        let app = self.router().into_make_service_with_connect_info::<SocketAddr>();
        let serve = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .into_future();
        tokio::pin!(serve);

        loop {
            tokio::select! {
                result = &mut serve => {
                    result?;
                    break;
                }
                Some(config) = config_updates.recv() => {
                    if let Err(e) = self.apply_config(config) {
                        tracing::error!(error = %e, "Configuration rejected, keeping current routes");
                    }
                }
            }
        }

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    /// The currently published route table.
    pub fn route_table(&self) -> Arc<RouteTable> {
        self.routes.load_full()
    }

    pub fn builder(&self) -> &RouteRuntimeBuilder {
        &self.builder
    }
}

/// Fallback handler: find the matching entry and invoke its handler.
async fn dispatch_handler(State(state): State<AppState>, mut request: Request<Body>) -> Response {
    let start = Instant::now();
    let request_id = request_id(&request).to_string();
    let method = request.method().to_string();

    let table = state.routes.load_full();
    let Some(matched) = table.match_request(&request) else {
        tracing::warn!(request_id = %request_id, path = %request.uri().path(), "No route matched");
        metrics::record_request(&method, 404, "none", start);
        return (StatusCode::NOT_FOUND, "No matching route found").into_response();
    };

    let handler = matched.entry().handler().clone();
    let route_id = matched.route().route_id().to_string();
    request.extensions_mut().insert(matched);

    match handler.invoke(request) {
        Ok(response) => response.await,
        Err(e) => {
            tracing::error!(request_id = %request_id, route_id = %route_id, error = %e, "Dispatch failed");
            metrics::record_request(&method, 500, &route_id, start);
            (StatusCode::INTERNAL_SERVER_ERROR, "Request pipeline unavailable").into_response()
        }
    }
}
