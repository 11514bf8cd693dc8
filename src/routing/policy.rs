//! Primary/secondary selection policy.
//!
//! # Responsibilities
//! - Pick the replica for the next request from the latest liveness snapshot
//! - Explain the choice with a human-readable reason
//!
//! # Design Decisions
//! - Pure function of (snapshot, preference): no I/O, no clocks, never blocks
//! - The preferred replica wins whenever it is up, regardless of the other one

use serde::Serialize;

use crate::health::state::LivenessSnapshot;
use crate::routing::Replica;

pub const NO_HEALTHY_BACKEND: &str = "No backend is healthy";

/// Outcome of consulting the policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RouteDecision {
    Routed {
        replica: Replica,
        reason: &'static str,
    },
    NoHealthyBackend,
}

impl RouteDecision {
    pub fn replica(&self) -> Option<Replica> {
        match self {
            RouteDecision::Routed { replica, .. } => Some(*replica),
            RouteDecision::NoHealthyBackend => None,
        }
    }

    pub fn reason(&self) -> &'static str {
        match self {
            RouteDecision::Routed { reason, .. } => reason,
            RouteDecision::NoHealthyBackend => NO_HEALTHY_BACKEND,
        }
    }
}

/// Choose a target replica.
pub fn choose(snapshot: &LivenessSnapshot, prefer_primary: bool) -> RouteDecision {
    let (preferred, preferred_reason, fallback_reason) = if prefer_primary {
        (
            Replica::Primary,
            "Primary is UP (preferred)",
            "Primary is DOWN -> failover to Secondary",
        )
    } else {
        (
            Replica::Secondary,
            "Secondary is UP (preferred)",
            "Secondary is DOWN -> fallback to Primary",
        )
    };

    if snapshot.is_up(preferred) {
        RouteDecision::Routed {
            replica: preferred,
            reason: preferred_reason,
        }
    } else if snapshot.is_up(preferred.other()) {
        RouteDecision::Routed {
            replica: preferred.other(),
            reason: fallback_reason,
        }
    } else {
        RouteDecision::NoHealthyBackend
    }
}
