//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap every outbound call (probe, forward, failover, stimulus) with a deadline
//! - Collapse deadline expiry into the same failure class as a connection error
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; the wrapped future is dropped on expiry
//! - The deadline covers the whole exchange, body included

use std::future::Future;
use std::time::Duration;

use tokio::time;

use crate::error::UpstreamError;

/// Run `fut` with a deadline, mapping expiry to [`UpstreamError::Timeout`].
pub async fn with_deadline<T, E, F>(deadline: Duration, fut: F) -> Result<T, UpstreamError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<UpstreamError>,
{
    match time::timeout(deadline, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_) => Err(UpstreamError::Timeout(deadline)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_expiry_is_a_transport_failure() {
        let result: Result<(), UpstreamError> = with_deadline(Duration::from_millis(50), async {
            time::sleep(Duration::from_secs(5)).await;
            Ok::<_, UpstreamError>(())
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err, UpstreamError::Timeout(Duration::from_millis(50)));
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn test_inner_error_passes_through() {
        let result: Result<(), UpstreamError> =
            with_deadline(Duration::from_secs(1), async { Err(UpstreamError::Status(500)) }).await;
        assert_eq!(result.unwrap_err(), UpstreamError::Status(500));
    }
}
