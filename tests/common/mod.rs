//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use routegate::config::{ClusterConfig, DestinationConfig, ProxyConfig, RouteConfig};
use routegate::{HttpServer, Shutdown};

/// A backend that echoes the request path, query and headers as JSON and
/// counts the requests it received.
pub struct EchoBackend {
    pub addr: SocketAddr,
    pub hits: Arc<AtomicUsize>,
}

impl EchoBackend {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Start an echo backend on an ephemeral port.
pub async fn start_echo_backend(name: &'static str) -> EchoBackend {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .fallback(move |State(hits): State<Arc<AtomicUsize>>, req: Request<Body>| async move {
            hits.fetch_add(1, Ordering::SeqCst);
            Json(json!({
                "backend": name,
                "method": req.method().as_str(),
                "path": req.uri().path(),
                "query": req.uri().query(),
                "headers": headers_to_json(req.headers()),
            }))
        })
        .with_state(hits.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    EchoBackend { addr, hits }
}

fn headers_to_json(headers: &HeaderMap) -> Value {
    let map = headers
        .iter()
        .map(|(k, v)| (k.as_str().to_string(), json!(v.to_str().unwrap_or(""))))
        .collect::<serde_json::Map<_, _>>();
    Value::Object(map)
}

/// A running proxy bound to an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    pub config_tx: mpsc::UnboundedSender<ProxyConfig>,
}

impl TestProxy {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Build and run a proxy for `config` in the background.
pub async fn start_proxy(config: ProxyConfig) -> TestProxy {
    let server = HttpServer::new(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let (config_tx, config_rx) = mpsc::unbounded_channel();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        server.run(listener, config_rx, shutdown_rx).await.unwrap();
    });

    TestProxy {
        addr,
        shutdown,
        config_tx,
    }
}

pub fn cluster(id: &str, backends: &[&EchoBackend]) -> ClusterConfig {
    ClusterConfig {
        cluster_id: id.to_string(),
        destinations: backends
            .iter()
            .enumerate()
            .map(|(i, b)| DestinationConfig {
                name: format!("{}-{}", id, i),
                address: b.url(),
            })
            .collect(),
    }
}

pub fn route(id: &str, path: &str, cluster_id: &str) -> RouteConfig {
    RouteConfig {
        route_id: id.to_string(),
        path: path.to_string(),
        cluster_id: Some(cluster_id.to_string()),
        ..Default::default()
    }
}
