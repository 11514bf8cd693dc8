//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → health::state (load latest liveness snapshot, non-blocking)
//!     → policy.rs (preferred replica if up, else the other, else none)
//!     → Return: RouteDecision { replica, reason } or NoHealthyBackend
//! ```
//!
//! # Design Decisions
//! - Preference is fixed at startup
//! - Deterministic: same snapshot and preference always yield the same decision
//! - The policy never probes; freshness is the health monitor's job

pub mod policy;
pub mod replica;

pub use policy::{choose, RouteDecision};
pub use replica::{Replica, Replicas};
