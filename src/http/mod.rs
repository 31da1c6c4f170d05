//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout)
//!     → dispatch handler (route table lookup)
//!     → entry handler → forwarder.rs (ProxyPipeline)
//!         → CORS / authorization
//!         → request transforms
//!         → destination pick and upstream call
//!         → response transforms
//!     → Send to client
//! ```

pub mod forwarder;
pub mod request;
pub mod server;

pub use forwarder::ProxyPipeline;
pub use request::{request_id, UuidRequestId, X_REQUEST_ID};
pub use server::HttpServer;
