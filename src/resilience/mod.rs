//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound call to a replica:
//!     → timeouts.rs (enforce T_req deadline)
//!     → expiry or connection error → UpstreamError::is_transport()
//!     → proxy::failover decides on the single failover attempt
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - No retries within a single target; at most one failover per request

pub mod timeouts;
