//! Request proxy subsystem.
//!
//! # Data Flow
//! ```text
//! GET /orders/{id}
//!     → state.decide() (routing policy on the latest liveness snapshot)
//!     → upstream.rs (forward to the chosen replica, deadline T_req)
//!     → 200: decorate payload, remember route
//!     → 404 / other status: fail, no failover
//!     → transport failure: failover.rs
//!         → fallback marked down: fail without calling it
//!         → otherwise exactly one call to the fallback
//!     → one RequestLog entry per request, whatever the outcome
//! ```
//!
//! # Design Decisions
//! - The failover decision inspects `UpstreamError` variants, nothing else
//! - The `Upstream` trait is the seam between routing logic and the network

pub mod failover;
pub mod upstream;

use std::future::Future;

use crate::error::UpstreamError;
use crate::order::OrderPayload;

pub use failover::RequestProxy;
pub use upstream::HttpUpstream;

/// Outbound calls the router makes to a replica.
pub trait Upstream: Send + Sync + 'static {
    /// Probe `GET {base_url}/health`. True iff the replica answered in time with a
    /// success status and a body reporting `status: "UP"`.
    fn check_health(&self, base_url: &str) -> impl Future<Output = bool> + Send;

    /// Fetch `GET {base_url}/orders/{order_id}`.
    fn get_order(
        &self,
        base_url: &str,
        order_id: i64,
    ) -> impl Future<Output = Result<OrderPayload, UpstreamError>> + Send;
}
