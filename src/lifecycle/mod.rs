//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Shutdown::trigger
//!
//! Shutdown (shutdown.rs):
//!     trigger → listener stops accepting and drains
//!             → health monitor abandons its in-flight probes and exits
//! ```
//!
//! # Design Decisions
//! - One `watch` flag; every long-running task holds its own listener, and a
//!   trigger sent before a task subscribes is still observed
//! - The health monitor is stopped after the listener, so routing decisions stay
//!   fresh while in-flight requests finish

pub mod shutdown;
pub mod signals;

pub use shutdown::{Shutdown, ShutdownListener};
pub use signals::spawn_signal_handler;
