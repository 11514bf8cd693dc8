use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "router-cli")]
#[command(about = "Control CLI for the failover router", long_about = None)]
struct Cli {
    #[arg(short, long, env = "ROUTER_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replica health, routing decision and injection markers
    Status,
    /// Where the next request would go
    Route,
    /// Fetch an order through the router
    Order { order_id: i64 },
    /// Inject a failure on the primary
    Fail {
        #[arg(short, long, default_value = "manual")]
        reason: String,
    },
    /// Clear the primary's simulated failure
    Recover,
    /// Switchover time and error rate around the last injection
    Metrics {
        #[arg(long, default_value_t = 2.0)]
        pre_window_s: f64,
        #[arg(long, default_value_t = 10.0)]
        post_window_s: f64,
    },
    /// Clear the request log and injection markers
    Reset,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Status => client.get(format!("{base}/status")),
        Commands::Route => client.get(format!("{base}/route")),
        Commands::Order { order_id } => client.get(format!("{base}/orders/{order_id}")),
        Commands::Fail { reason } => client
            .post(format!("{base}/stimulus/fail-primary"))
            .query(&[("reason", reason)]),
        Commands::Recover => client.post(format!("{base}/stimulus/recover-primary")),
        Commands::Metrics {
            pre_window_s,
            post_window_s,
        } => client
            .get(format!("{base}/metrics"))
            .query(&[("pre_window_s", pre_window_s), ("post_window_s", post_window_s)]),
        Commands::Reset => client.post(format!("{base}/stimulus/reset-metrics")),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: router returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
