//! Failover router (v1)
//!
//! Sends order lookups to one of two replicas, fails over immediately when the
//! chosen replica stops answering, and measures how long the switch took.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                   FAILOVER ROUTER                    │
//!                      │                                                      │
//!   Client Request     │  ┌─────────┐    ┌──────────┐    ┌──────────────┐     │
//!   ───────────────────┼─▶│  http   │───▶│ routing  │───▶│    proxy     │─────┼──▶ PRIMARY
//!                      │  │ server  │    │  policy  │    │ + failover   │─────┼──▶ SECONDARY
//!                      │  └────┬────┘    └────▲─────┘    └──────┬───────┘     │
//!                      │       │              │                 │             │
//!                      │       │        ┌─────┴──────┐   ┌──────▼───────┐     │
//!                      │       │        │   health   │   │ request log  │     │
//!                      │       │        │  monitor   │   │  (bounded)   │     │
//!                      │       │        └────────────┘   └──────┬───────┘     │
//!                      │       │                                │             │
//!                      │       └──────── /metrics ──────▶ measurement engine  │
//!                      │                                                      │
//!                      │  Cross-cutting: config, observability, lifecycle     │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use failover_router::config::load_config;
use failover_router::lifecycle::{spawn_signal_handler, Shutdown};
use failover_router::observability::{logging, metrics};
use failover_router::HttpServer;

#[derive(Parser)]
#[command(name = "failover-router", version, about = "PRIMARY/SECONDARY failover router")]
struct Cli {
    /// Optional TOML config file. Environment variables override it.
    #[arg(short, long, env = "ROUTER_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    logging::init(&config.observability);
    tracing::info!("failover-router v{} starting", env!("CARGO_PKG_VERSION"));

    tracing::info!(
        bind_address = %config.listener.bind_address,
        primary_url = %config.replicas.primary_url,
        secondary_url = %config.replicas.secondary_url,
        health_interval_secs = config.health_check.interval_secs,
        request_timeout_secs = config.health_check.request_timeout_secs,
        prefer_primary = config.routing.prefer_primary,
        request_log_capacity = config.request_log.capacity,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    let server = HttpServer::new(config)?;
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
