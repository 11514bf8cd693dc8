//! Operational metrics and their Prometheus exposition.
//!
//! # Metrics
//! - `router_requests_total` (counter): routed requests by replica and status
//! - `router_request_duration_seconds` (histogram): end-to-end routing latency
//! - `router_backend_up` (gauge): 1=up, 0=down, per replica
//! - `router_failovers_total` (counter): immediate failovers by outcome
//!
//! # Design Decisions
//! - These are for dashboards; switchover/error-rate analysis lives in `measurement`
//! - Recording without an installed exporter is a no-op (tests, disabled config)

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::routing::Replica;

/// Outcome label of an immediate failover attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailoverOutcome {
    Success,
    /// The fallback was already marked down; no call was made.
    Skipped,
    Failed,
}

impl FailoverOutcome {
    fn as_str(self) -> &'static str {
        match self {
            FailoverOutcome::Success => "success",
            FailoverOutcome::Skipped => "skipped",
            FailoverOutcome::Failed => "failed",
        }
    }
}

/// Start the Prometheus scrape endpoint on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Prometheus metrics endpoint started");
    Ok(())
}

fn replica_label(replica: Option<Replica>) -> &'static str {
    replica.map(Replica::as_str).unwrap_or("NONE")
}

pub fn record_request(routed_to: Option<Replica>, status: u16, started: Instant) {
    let routed_to = replica_label(routed_to);
    counter!(
        "router_requests_total",
        "routed_to" => routed_to,
        "status" => status.to_string()
    )
    .increment(1);
    histogram!("router_request_duration_seconds", "routed_to" => routed_to)
        .record(started.elapsed().as_secs_f64());
}

pub fn record_backend_health(replica: Replica, up: bool) {
    gauge!("router_backend_up", "replica" => replica.as_str()).set(if up { 1.0 } else { 0.0 });
}

pub fn record_failover(outcome: FailoverOutcome) {
    counter!("router_failovers_total", "outcome" => outcome.as_str()).increment(1);
}
