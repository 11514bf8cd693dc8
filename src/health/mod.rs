//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer (T_health)
//!     → probe.rs against PRIMARY and SECONDARY, concurrently
//!     → publish one LivenessSnapshot into state.rs
//!
//! Readers (routing policy, request proxy, status endpoints):
//!     → load the latest snapshot, never blocking the monitor
//! ```
//!
//! # Design Decisions
//! - Single writer: only the monitor publishes liveness
//! - One probe result decides the state; there is no passive marking from traffic
//! - Both replicas start DOWN until the first tick completes

pub mod active;
pub mod probe;
pub mod state;

pub use active::HealthMonitor;
pub use state::{LivenessBoard, LivenessSnapshot, ReplicaState};
