//! Published replica liveness.
//!
//! # States
//! - Up: the last probe of the replica succeeded
//! - Down: the last probe failed, or no probe has completed yet
//!
//! # Design Decisions
//! - The monitor is the only writer; it publishes one immutable snapshot per tick
//! - Readers load the whole snapshot atomically (ArcSwap), so both flags and the
//!   check time always come from the same tick
//! - No hysteresis: a single probe result flips the state
//! - Transitions are logged here so every writer gets them for free

use std::sync::Arc;

use arc_swap::ArcSwap;
use serde::Serialize;

use crate::clock::Timestamp;
use crate::routing::Replica;

/// Up/down pair produced by a single health tick.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LivenessSnapshot {
    pub primary_up: bool,
    pub secondary_up: bool,
    /// When the tick that produced this snapshot completed. `None` before the first tick.
    pub checked_at: Option<Timestamp>,
}

impl LivenessSnapshot {
    pub fn new(primary_up: bool, secondary_up: bool, checked_at: Timestamp) -> Self {
        Self {
            primary_up,
            secondary_up,
            checked_at: Some(checked_at),
        }
    }

    pub fn is_up(&self, replica: Replica) -> bool {
        match replica {
            Replica::Primary => self.primary_up,
            Replica::Secondary => self.secondary_up,
        }
    }
}

/// Per-replica view of the latest snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplicaState {
    pub url: String,
    pub is_up: bool,
    pub last_checked_at: Option<Timestamp>,
}

/// Single-writer / multi-reader holder of the latest liveness snapshot.
#[derive(Debug, Default)]
pub struct LivenessBoard {
    current: ArcSwap<LivenessSnapshot>,
}

impl LivenessBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest published snapshot. Never blocks.
    pub fn snapshot(&self) -> LivenessSnapshot {
        **self.current.load()
    }

    /// Replace the snapshot, logging any replica whose state changed.
    pub fn publish(&self, next: LivenessSnapshot) {
        let previous = self.current.swap(Arc::new(next));
        for replica in [Replica::Primary, Replica::Secondary] {
            let (was, now) = (previous.is_up(replica), next.is_up(replica));
            match (was, now) {
                (true, false) => tracing::warn!(replica = %replica, "Replica marked DOWN"),
                (false, true) => tracing::info!(replica = %replica, "Replica marked UP"),
                _ => {}
            }
        }
    }
}
