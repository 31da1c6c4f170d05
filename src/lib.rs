//! Route-level reverse proxy library.
//!
//! Routes are compiled from configuration into linked runtime models
//! (`RouteRuntimeConfig` ⇄ `DispatchEntry`) whose handlers reach a request
//! pipeline that is installed after the routes are built.

pub mod cluster;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;
pub mod transforms;

pub use config::schema::ProxyConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::{RouteRuntimeBuilder, RouteRuntimeConfig};
