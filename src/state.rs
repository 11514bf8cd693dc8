//! Process-wide router state.
//!
//! One `RouterState` is created at startup and shared via `Arc` with the health
//! monitor, the request proxy and the HTTP handlers. Each field has a single kind
//! of writer:
//! - liveness: the health monitor
//! - last route: the request proxy
//! - failure injection: the stimulus handlers and the reset operation

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use serde::Serialize;

use crate::clock::Timestamp;
use crate::health::state::{LivenessBoard, ReplicaState};
use crate::routing::{self, Replica, Replicas, RouteDecision};

/// The most recent successful routing outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastRoute {
    pub routed_to: Replica,
    pub reason: String,
}

/// Marker left by a manual failure injection (t0).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FailureInjection {
    pub injected_at: Timestamp,
    pub target: Replica,
}

#[derive(Debug)]
pub struct RouterState {
    replicas: Replicas,
    prefer_primary: bool,
    liveness: LivenessBoard,
    last_route: ArcSwapOption<LastRoute>,
    injection: ArcSwapOption<FailureInjection>,
}

impl RouterState {
    pub fn new(replicas: Replicas, prefer_primary: bool) -> Self {
        Self {
            replicas,
            prefer_primary,
            liveness: LivenessBoard::new(),
            last_route: ArcSwapOption::empty(),
            injection: ArcSwapOption::empty(),
        }
    }

    pub fn replicas(&self) -> &Replicas {
        &self.replicas
    }

    pub fn prefer_primary(&self) -> bool {
        self.prefer_primary
    }

    pub fn liveness(&self) -> &LivenessBoard {
        &self.liveness
    }

    /// Consult the routing policy against the latest snapshot.
    pub fn decide(&self) -> RouteDecision {
        routing::choose(&self.liveness.snapshot(), self.prefer_primary)
    }

    pub fn replica_state(&self, replica: Replica) -> ReplicaState {
        let snapshot = self.liveness.snapshot();
        ReplicaState {
            url: self.replicas.url(replica).to_string(),
            is_up: snapshot.is_up(replica),
            last_checked_at: snapshot.checked_at,
        }
    }

    pub fn last_route(&self) -> Option<LastRoute> {
        self.last_route.load_full().map(|route| (*route).clone())
    }

    pub fn record_route(&self, routed_to: Replica, reason: &str) {
        self.last_route.store(Some(Arc::new(LastRoute {
            routed_to,
            reason: reason.to_string(),
        })));
    }

    pub fn failure_injection(&self) -> Option<FailureInjection> {
        self.injection.load_full().map(|injection| *injection)
    }

    pub fn mark_failure_injected(&self, target: Replica, injected_at: Timestamp) {
        self.injection.store(Some(Arc::new(FailureInjection { injected_at, target })));
    }

    pub fn clear_failure_injection(&self) {
        self.injection.store(None);
    }
}
