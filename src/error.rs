//! Error definitions.
//!
//! `UpstreamError` describes one outbound call; `RouterError` is what a routed
//! request or an operator action finally fails with. The mapping of
//! `RouterError` to HTTP lives in `http::response`.

use std::time::Duration;

use thiserror::Error;

/// Result of a single outbound call that did not produce a usable payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum UpstreamError {
    /// No response within the request deadline.
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// Connection refused, reset, DNS failure, ...
    #[error("transport error: {0}")]
    Transport(String),

    /// The replica answered with a status other than the expected one.
    #[error("unexpected status {0}")]
    Status(u16),

    /// The replica answered 200 but the body was not what we expected.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),
}

impl UpstreamError {
    /// Transport-level failures are the only trigger for failover.
    pub fn is_transport(&self) -> bool {
        matches!(self, UpstreamError::Timeout(_) | UpstreamError::Transport(_))
    }
}

impl From<reqwest::Error> for UpstreamError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            UpstreamError::Transport(format!("timeout: {e}"))
        } else if e.is_decode() {
            UpstreamError::InvalidPayload(e.to_string())
        } else {
            UpstreamError::Transport(e.to_string())
        }
    }
}

/// Terminal failure of a router operation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouterError {
    /// No replica is up according to the latest health snapshot.
    #[error("No healthy backend available")]
    NoHealthyBackend,

    /// The order does not exist. Never triggers failover.
    #[error("Order not found")]
    NotFound,

    /// The replica answered with an application-level error. Never triggers failover.
    #[error("Backend error (status {status})")]
    BadGateway { status: u16 },

    /// Transport failure on the chosen replica and the failover did not succeed.
    #[error("{0}")]
    ServiceUnavailable(String),

    /// The operation needs state that does not exist yet.
    #[error("{0}")]
    InvalidState(String),

    /// Metrics window parameters out of range.
    #[error("{0}")]
    InvalidWindow(String),

    /// The primary refused or could not be reached for a stimulus call.
    #[error("{message}")]
    Stimulus {
        message: String,
        source: UpstreamError,
    },
}

impl RouterError {
    /// Short machine-readable kind, used in error bodies and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            RouterError::NoHealthyBackend => "no_healthy_backend",
            RouterError::NotFound => "not_found",
            RouterError::BadGateway { .. } => "bad_gateway",
            RouterError::ServiceUnavailable(_) => "service_unavailable",
            RouterError::InvalidState(_) => "invalid_state",
            RouterError::InvalidWindow(_) => "invalid_window",
            RouterError::Stimulus { .. } => "stimulus_failed",
        }
    }
}
