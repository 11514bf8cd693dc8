//! Switchover and error-rate computation.
//!
//! Given the failure-injection time `t0` and a window `[t0 - pre, t0 + post]`:
//!
//! ```text
//! total / failed        entries inside the window, failed = status != 200
//! error_rate_percent    failed / total * 100, 2 decimals (None when total == 0)
//! t_first_error         first entry at or after t0 with status != 200 (whole log)
//! t_first_success       first 200 at or after t0 served by SECONDARY
//! from_injection_s      t_first_success - t0, 4 decimals
//! from_first_error_s    t_first_success - t_first_error, 4 decimals
//! ```
//!
//! Read-only: the engine never mutates the log or the router state.

use std::sync::Arc;

use serde::Serialize;

use crate::clock::{round_to, Timestamp};
use crate::error::RouterError;
use crate::measurement::request_log::{LogEntry, RequestLog};
use crate::routing::Replica;
use crate::state::RouterState;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MetricsWindow {
    pub start_ts: Timestamp,
    pub end_ts: Timestamp,
    pub pre_s: f64,
    pub post_s: f64,
}

impl MetricsWindow {
    pub fn contains(&self, ts: Timestamp) -> bool {
        self.start_ts <= ts && ts <= self.end_ts
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Switchover {
    /// `t_first_success_on_fallback - t0`.
    pub from_injection_s: Option<f64>,
    /// `t_first_success_on_fallback - t_first_error`.
    pub from_first_error_s: Option<f64>,
    pub t_first_error_ts: Option<Timestamp>,
    pub t_first_success_on_fallback_ts: Option<Timestamp>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRate {
    pub total_requests_in_window: usize,
    pub failed_requests_in_window: usize,
    pub error_rate_percent: Option<f64>,
    pub definition: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub injected_at_ts: Timestamp,
    pub window: MetricsWindow,
    pub switchover: Switchover,
    pub error_rate: ErrorRate,
}

const ERROR_DEFINITION: &str =
    "status != 200 is considered a failure (includes timeouts and 5xx mapped to 502/503)";

/// Validate window bounds: finite and non-negative.
pub fn check_window(pre_window_s: f64, post_window_s: f64) -> Result<(), RouterError> {
    for (name, value) in [("pre_window_s", pre_window_s), ("post_window_s", post_window_s)] {
        if !value.is_finite() || value < 0.0 {
            return Err(RouterError::InvalidWindow(format!(
                "{name} must be a finite number >= 0 (got {value})"
            )));
        }
    }
    Ok(())
}

/// The injection stimulus always targets PRIMARY, so recovery is measured on SECONDARY
/// whatever the routing preference.
const FALLBACK: Replica = Replica::Secondary;

/// Compute the report over `entries` (oldest first).
pub fn compute_metrics(
    entries: &[LogEntry],
    injected_at: Option<Timestamp>,
    pre_window_s: f64,
    post_window_s: f64,
) -> Result<MetricsReport, RouterError> {
    check_window(pre_window_s, post_window_s)?;
    let t0 = injected_at.ok_or_else(|| {
        RouterError::InvalidState(
            "No failure injected yet. Call POST /stimulus/fail-primary first.".to_string(),
        )
    })?;

    let window = MetricsWindow {
        start_ts: t0 - pre_window_s,
        end_ts: t0 + post_window_s,
        pre_s: pre_window_s,
        post_s: post_window_s,
    };

    let (total, failed) = entries
        .iter()
        .filter(|e| window.contains(e.timestamp))
        .fold((0usize, 0usize), |(total, failed), e| {
            (total + 1, failed + usize::from(!e.is_success()))
        });

    let after_injection = || entries.iter().filter(move |e| e.timestamp >= t0);
    let t_first_error = after_injection()
        .find(|e| !e.is_success())
        .map(|e| e.timestamp);
    let t_first_success = after_injection()
        .find(|e| e.is_success() && e.routed_to == Some(FALLBACK))
        .map(|e| e.timestamp);

    let from_injection_s = t_first_success.map(|ts| round_to(ts - t0, 4));
    let from_first_error_s = match (t_first_success, t_first_error) {
        (Some(success), Some(error)) => Some(round_to(success - error, 4)),
        _ => None,
    };

    let error_rate_percent =
        (total > 0).then(|| round_to(failed as f64 / total as f64 * 100.0, 2));

    Ok(MetricsReport {
        injected_at_ts: t0,
        window,
        switchover: Switchover {
            from_injection_s,
            from_first_error_s,
            t_first_error_ts: t_first_error,
            t_first_success_on_fallback_ts: t_first_success,
        },
        error_rate: ErrorRate {
            total_requests_in_window: total,
            failed_requests_in_window: failed,
            error_rate_percent,
            definition: ERROR_DEFINITION,
        },
    })
}

/// Binds the computation to the live router state and request log.
#[derive(Debug, Clone)]
pub struct MetricsEngine {
    state: Arc<RouterState>,
    log: Arc<RequestLog>,
}

impl MetricsEngine {
    pub fn new(state: Arc<RouterState>, log: Arc<RequestLog>) -> Self {
        Self { state, log }
    }

    pub fn compute(&self, pre_window_s: f64, post_window_s: f64) -> Result<MetricsReport, RouterError> {
        let injected_at = self.state.failure_injection().map(|i| i.injected_at);
        compute_metrics(
            &self.log.snapshot(),
            injected_at,
            pre_window_s,
            post_window_s,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::Replicas;

    fn entry(timestamp: f64, status: u16, routed_to: Option<Replica>) -> LogEntry {
        LogEntry {
            timestamp,
            status,
            routed_to,
            target: None,
            note: None,
        }
    }

    fn scenario() -> Vec<LogEntry> {
        vec![
            entry(99.0, 200, Some(Replica::Primary)),
            entry(100.2, 503, None),
            entry(100.4, 200, Some(Replica::Secondary)),
            entry(101.0, 200, Some(Replica::Secondary)),
        ]
    }

    #[test]
    fn test_failover_scenario() {
        let report = compute_metrics(&scenario(), Some(100.0), 2.0, 10.0).unwrap();

        assert_eq!(report.window.start_ts, 98.0);
        assert_eq!(report.window.end_ts, 110.0);
        assert_eq!(report.error_rate.total_requests_in_window, 4);
        assert_eq!(report.error_rate.failed_requests_in_window, 1);
        assert_eq!(report.error_rate.error_rate_percent, Some(25.0));
        assert_eq!(report.switchover.t_first_error_ts, Some(100.2));
        assert_eq!(report.switchover.t_first_success_on_fallback_ts, Some(100.4));
        assert_eq!(report.switchover.from_injection_s, Some(0.4));
        assert_eq!(report.switchover.from_first_error_s, Some(0.2));
    }

    #[test]
    fn test_requires_injection() {
        let err = compute_metrics(&scenario(), None, 2.0, 10.0).unwrap_err();
        assert!(matches!(err, RouterError::InvalidState(_)));
    }

    #[test]
    fn test_rejects_negative_window() {
        let err = compute_metrics(&scenario(), Some(100.0), -1.0, 10.0).unwrap_err();
        assert!(matches!(err, RouterError::InvalidWindow(_)));
        assert!(check_window(0.0, f64::INFINITY).is_err());
        assert!(check_window(0.0, 0.0).is_ok());
    }

    #[test]
    fn test_empty_window_has_no_rate() {
        let report = compute_metrics(&scenario(), Some(500.0), 1.0, 1.0).unwrap();
        assert_eq!(report.error_rate.total_requests_in_window, 0);
        assert_eq!(report.error_rate.error_rate_percent, None);
        assert_eq!(report.switchover.from_injection_s, None);
        assert_eq!(report.switchover.from_first_error_s, None);
    }

    #[test]
    fn test_first_error_searched_beyond_window() {
        let entries = vec![
            entry(100.5, 200, Some(Replica::Secondary)),
            entry(120.0, 502, Some(Replica::Primary)),
        ];
        let report = compute_metrics(&entries, Some(100.0), 0.0, 1.0).unwrap();

        assert_eq!(report.error_rate.total_requests_in_window, 1);
        assert_eq!(report.error_rate.failed_requests_in_window, 0);
        assert_eq!(report.switchover.t_first_error_ts, Some(120.0));
        assert_eq!(report.switchover.from_first_error_s, Some(-19.5));
    }

    #[test]
    fn test_not_found_counts_as_failure() {
        let entries = vec![
            entry(100.1, 404, Some(Replica::Primary)),
            entry(100.2, 200, Some(Replica::Primary)),
            entry(100.3, 200, Some(Replica::Primary)),
        ];
        let report = compute_metrics(&entries, Some(100.0), 0.0, 1.0).unwrap();
        assert_eq!(report.error_rate.error_rate_percent, Some(33.33));
        assert_eq!(report.switchover.t_first_success_on_fallback_ts, None);
    }

    #[test]
    fn test_primary_successes_are_not_a_switchover() {
        let entries = vec![entry(100.1, 200, Some(Replica::Primary))];
        let report = compute_metrics(&entries, Some(100.0), 0.0, 1.0).unwrap();
        assert_eq!(report.switchover.t_first_success_on_fallback_ts, None);
    }

    #[test]
    fn test_switchover_measured_on_secondary_when_secondary_preferred() {
        let state = Arc::new(RouterState::new(Replicas::new("http://a", "http://b"), false));
        let log = Arc::new(RequestLog::new(16));
        log.append(entry(100.2, 200, Some(Replica::Primary)));
        log.append(entry(100.4, 200, Some(Replica::Secondary)));
        state.mark_failure_injected(Replica::Primary, 100.0);

        let report = MetricsEngine::new(state, log).compute(2.0, 10.0).unwrap();
        assert_eq!(report.switchover.t_first_success_on_fallback_ts, Some(100.4));
        assert_eq!(report.switchover.from_injection_s, Some(0.4));
    }

    #[test]
    fn test_engine_reads_live_state() {
        let state = Arc::new(RouterState::new(Replicas::new("http://a", "http://b"), true));
        let log = Arc::new(RequestLog::new(16));
        let engine = MetricsEngine::new(state.clone(), log.clone());

        assert!(matches!(engine.compute(2.0, 10.0), Err(RouterError::InvalidState(_))));

        for e in scenario() {
            log.append(e);
        }
        state.mark_failure_injected(Replica::Primary, 100.0);
        let report = engine.compute(2.0, 10.0).unwrap();
        assert_eq!(report.switchover.t_first_success_on_fallback_ts, Some(100.4));
        assert_eq!(report.error_rate.error_rate_percent, Some(25.0));
    }
}
