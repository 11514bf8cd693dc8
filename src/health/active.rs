//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe both replicas
//! - Publish the resulting liveness pair as one snapshot

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};

use crate::clock::unix_now;
use crate::health::state::LivenessSnapshot;
use crate::lifecycle::ShutdownListener;
use crate::observability::metrics;
use crate::proxy::Upstream;
use crate::routing::Replica;
use crate::state::RouterState;

pub struct HealthMonitor<U> {
    state: Arc<RouterState>,
    upstream: Arc<U>,
    interval: Duration,
}

impl<U: Upstream> HealthMonitor<U> {
    pub fn new(state: Arc<RouterState>, upstream: Arc<U>, interval: Duration) -> Self {
        Self {
            state,
            upstream,
            interval,
        }
    }

    /// Spawn the polling loop onto the runtime.
    pub fn spawn(self, shutdown: ShutdownListener) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Poll until shutdown. The first tick fires immediately.
    pub async fn run(self, mut shutdown: ShutdownListener) {
        tracing::info!(
            interval_secs = self.interval.as_secs_f64(),
            primary = %self.state.replicas().url(Replica::Primary),
            secondary = %self.state.replicas().url(Replica::Secondary),
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // The tick and its probes race the shutdown signal together, so an
            // in-flight probe is dropped and its result never published.
            tokio::select! {
                _ = async {
                    ticker.tick().await;
                    self.poll_once().await;
                } => {}
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    /// Probe both replicas concurrently and publish the pair.
    pub async fn poll_once(&self) -> LivenessSnapshot {
        let replicas = self.state.replicas();
        let (primary_up, secondary_up) = tokio::join!(
            self.upstream.check_health(replicas.url(Replica::Primary)),
            self.upstream.check_health(replicas.url(Replica::Secondary)),
        );

        let snapshot = LivenessSnapshot::new(primary_up, secondary_up, unix_now());
        self.state.liveness().publish(snapshot);

        metrics::record_backend_health(Replica::Primary, primary_up);
        metrics::record_backend_health(Replica::Secondary, secondary_up);
        tracing::trace!(primary_up, secondary_up, "Health tick complete");

        snapshot
    }
}
