//! routegate: a route-level reverse proxy.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ───────────▶ http server ──▶ route table ──▶ entry handler ──▶ pipeline
//!                  (request id,    (host, path,    (direct or        │
//!                   trace,          method)         deferred)        ▼
//!                   timeout)                                   CORS / authz
//!                                                                    │
//!     Client Response                                                ▼
//!     ◀─────────── response transforms ◀── cluster destination ◀── request transforms
//!
//!     config file ──▶ watcher ──▶ route catalog ──▶ new route table (atomic swap)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use routegate::config::{load_config, ConfigWatcher, ProxyConfig};
use routegate::lifecycle::{signals, Shutdown};
use routegate::observability::{logging, metrics};
use routegate::HttpServer;

#[derive(Parser, Debug)]
#[command(name = "routegate", version, about = "Route-level reverse proxy")]
struct Args {
    /// Path to the TOML configuration file. Reloaded on change.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level override (e.g. "debug", "routegate=trace").
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    let level = args
        .log_level
        .clone()
        .unwrap_or_else(|| config.observability.log_level.clone());
    logging::init_logging(&level);

    tracing::info!("routegate v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        routes = config.routes.len(),
        clusters = config.clusters.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    // Routes are built here; traffic starts only after the pipeline is installed in run().
    let server = HttpServer::new(config.clone())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let (config_updates, _watcher) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (updates, Some(watcher.run(config.clone())?))
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (updates, None)
        }
    };

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    signals::spawn_signal_handler(shutdown);

    server.run(listener, config_updates, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
