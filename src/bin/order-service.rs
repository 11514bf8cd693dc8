use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use failover_router::config::ObservabilityConfig;
use failover_router::lifecycle::signals::wait_for_signal;
use failover_router::observability::logging;
use failover_router::service::{OrderService, ServiceConfig};

#[derive(Parser)]
#[command(name = "order-service")]
#[command(about = "Simulated order service replica", long_about = None)]
struct Cli {
    #[arg(short, long, env = "BIND_ADDRESS", default_value = "0.0.0.0:8081")]
    bind: String,

    #[arg(short, long, env = "SERVICE_NAME", default_value = "Service")]
    name: String,

    /// Delay added to /health and /orders/{id}
    #[arg(long, env = "SIMULATED_LATENCY_MS", default_value_t = 0)]
    latency_ms: u64,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init(&ObservabilityConfig::default());

    let service = OrderService::new(ServiceConfig {
        name: cli.name,
        simulated_latency: Duration::from_millis(cli.latency_ms),
    });

    let listener = TcpListener::bind(&cli.bind).await?;
    service.serve(listener, wait_for_signal()).await?;
    Ok(())
}
