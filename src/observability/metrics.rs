//! Metrics collection and exposition.
//!
//! # Metrics
//! - `proxy_requests_total` (counter): dispatched requests by method, status, route
//! - `proxy_request_duration_seconds` (histogram): latency distribution
//! - `proxy_routes_built_total` (counter): route builds by outcome
//! - `proxy_route_table_size` (gauge): entries in the active route table
//!
//! # Design Decisions
//! - Recording goes through the `metrics` facade; without an installed
//!   recorder the calls are no-ops (unit tests, library use)
//! - Prometheus exporter is optional and bound to its own address

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("status", status.to_string()),
        ("route", route.to_string()),
    ];
    metrics::counter!("proxy_requests_total", &labels[..]).increment(1);
    metrics::histogram!("proxy_request_duration_seconds", &labels[..])
        .record(start.elapsed().as_secs_f64());
}

/// Record one route build attempt.
pub fn record_route_built(outcome: &'static str) {
    metrics::counter!("proxy_routes_built_total", "outcome" => outcome).increment(1);
}

/// Record the size of a freshly published route table.
pub fn record_route_table_size(entries: usize) {
    metrics::gauge!("proxy_route_table_size").set(entries as f64);
}
