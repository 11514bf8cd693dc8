//! Resilience measurement subsystem.
//!
//! # Data Flow
//! ```text
//! Request proxy outcome
//!     → request_log.rs (bounded FIFO of immutable entries)
//!
//! GET /metrics
//!     → engine.rs (snapshot log + failure injection time t0)
//!     → switchover time and windowed error rate
//! ```
//!
//! # Design Decisions
//! - Every terminal outcome of a routed request produces exactly one entry
//! - "Failed" means status != 200, whatever the error kind
//! - The engine works on a copy; appends never wait for a metrics computation

pub mod engine;
pub mod request_log;

pub use engine::{compute_metrics, MetricsEngine, MetricsReport};
pub use request_log::{LogEntry, RequestLog};
