//! Order forwarding with a single immediate failover.

use std::sync::Arc;
use std::time::Instant;

use crate::error::{RouterError, UpstreamError};
use crate::measurement::RequestLog;
use crate::observability::metrics::{self, FailoverOutcome};
use crate::order::{OrderPayload, RoutedOrder};
use crate::proxy::Upstream;
use crate::routing::{Replica, RouteDecision};
use crate::state::RouterState;

pub const FAILOVER_REASON: &str = "Immediate failover after request error";
pub const FAILOVER_NOTE: &str = "Backend failed between health checks";

/// Routes order lookups to a replica and records every outcome.
pub struct RequestProxy<U> {
    state: Arc<RouterState>,
    log: Arc<RequestLog>,
    upstream: Arc<U>,
}

impl<U> Clone for RequestProxy<U> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            log: self.log.clone(),
            upstream: self.upstream.clone(),
        }
    }
}

impl<U: Upstream> RequestProxy<U> {
    pub fn new(state: Arc<RouterState>, log: Arc<RequestLog>, upstream: Arc<U>) -> Self {
        Self { state, log, upstream }
    }

    /// Serve `GET /orders/{order_id}`.
    pub async fn route_order(&self, order_id: i64) -> Result<RoutedOrder, RouterError> {
        let started = Instant::now();

        let (replica, reason) = match self.state.decide() {
            RouteDecision::Routed { replica, reason } => (replica, reason),
            RouteDecision::NoHealthyBackend => {
                tracing::warn!(order_id, "No healthy backend available");
                self.log.record(503, None, None, Some("no_healthy_backend"));
                metrics::record_request(None, 503, started);
                return Err(RouterError::NoHealthyBackend);
            }
        };
        let target = self.state.replicas().url(replica);

        tracing::debug!(order_id, replica = %replica, target = %target, "Forwarding order request");

        match self.upstream.get_order(target, order_id).await {
            Ok(order) => Ok(self.succeed(order, replica, reason, None, None, started)),
            Err(UpstreamError::Status(404)) => {
                self.finish(404, replica, "not_found", started);
                Err(RouterError::NotFound)
            }
            Err(UpstreamError::Status(status)) => {
                tracing::warn!(order_id, replica = %replica, status, "Backend error");
                self.finish(status, replica, "backend_error", started);
                Err(RouterError::BadGateway { status })
            }
            Err(UpstreamError::InvalidPayload(e)) => {
                tracing::warn!(order_id, replica = %replica, error = %e, "Backend returned an invalid payload");
                self.finish(502, replica, "invalid_payload", started);
                Err(RouterError::BadGateway { status: 502 })
            }
            Err(e @ (UpstreamError::Timeout(_) | UpstreamError::Transport(_))) => {
                tracing::warn!(order_id, replica = %replica, error = %e, "Request failed, attempting immediate failover");
                self.fail_over(order_id, replica, started).await
            }
        }
    }

    async fn fail_over(
        &self,
        order_id: i64,
        failed: Replica,
        started: Instant,
    ) -> Result<RoutedOrder, RouterError> {
        let fallback = failed.other();
        let target = self.state.replicas().url(fallback);

        if !self.state.liveness().snapshot().is_up(fallback) {
            let note = format!("fallback_{}_down", fallback.role());
            tracing::warn!(order_id, fallback = %fallback, "Fallback is marked down, not attempting it");
            self.finish(503, fallback, &note, started);
            metrics::record_failover(FailoverOutcome::Skipped);
            return Err(RouterError::ServiceUnavailable(format!(
                "{} is down and request failed",
                capitalize(fallback.role())
            )));
        }

        let status = match self.upstream.get_order(target, order_id).await {
            Ok(order) => {
                metrics::record_failover(FailoverOutcome::Success);
                return Ok(self.succeed(
                    order,
                    fallback,
                    FAILOVER_REASON,
                    Some(FAILOVER_NOTE),
                    Some("immediate_failover"),
                    started,
                ));
            }
            Err(UpstreamError::Status(status)) => {
                self.finish(status, fallback, "fallback_non_200", started);
                status
            }
            Err(UpstreamError::InvalidPayload(_)) => {
                self.finish(502, fallback, "fallback_non_200", started);
                502
            }
            Err(UpstreamError::Timeout(_) | UpstreamError::Transport(_)) => {
                self.finish(503, fallback, "fallback_exception", started);
                503
            }
        };

        tracing::error!(order_id, fallback = %fallback, status, "Failover attempt failed");
        metrics::record_failover(FailoverOutcome::Failed);
        Err(RouterError::ServiceUnavailable("Failover attempt failed".to_string()))
    }

    fn succeed(
        &self,
        order: OrderPayload,
        replica: Replica,
        reason: &str,
        client_note: Option<&str>,
        log_note: Option<&str>,
        started: Instant,
    ) -> RoutedOrder {
        self.state.record_route(replica, reason);
        self.log
            .record(200, Some(replica), Some(self.state.replicas().url(replica)), log_note);
        metrics::record_request(Some(replica), 200, started);

        RoutedOrder {
            order,
            routed_to: replica,
            route_reason: reason.to_string(),
            note: client_note.map(str::to_string),
        }
    }

    fn finish(&self, status: u16, replica: Replica, note: &str, started: Instant) {
        self.log.record(
            status,
            Some(replica),
            Some(self.state.replicas().url(replica)),
            Some(note),
        );
        metrics::record_request(Some(replica), status, started);
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::health::state::LivenessSnapshot;
    use crate::routing::Replicas;

    const PRIMARY: &str = "http://primary";
    const SECONDARY: &str = "http://secondary";

    /// Scripted upstream: each URL answers from its own queue of outcomes.
    #[derive(Default)]
    struct ScriptedUpstream {
        orders: Mutex<HashMap<String, VecDeque<Result<OrderPayload, UpstreamError>>>>,
        calls: Mutex<HashMap<String, usize>>,
        total_calls: AtomicUsize,
    }

    impl ScriptedUpstream {
        fn push(&self, url: &str, outcome: Result<OrderPayload, UpstreamError>) {
            self.orders
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push_back(outcome);
        }

        fn calls_to(&self, url: &str) -> usize {
            self.calls.lock().unwrap().get(url).copied().unwrap_or(0)
        }
    }

    impl Upstream for ScriptedUpstream {
        async fn check_health(&self, _base_url: &str) -> bool {
            true
        }

        async fn get_order(&self, base_url: &str, _order_id: i64) -> Result<OrderPayload, UpstreamError> {
            self.total_calls.fetch_add(1, Ordering::SeqCst);
            *self.calls.lock().unwrap().entry(base_url.to_string()).or_default() += 1;
            self.orders
                .lock()
                .unwrap()
                .get_mut(base_url)
                .and_then(VecDeque::pop_front)
                .unwrap_or_else(|| Err(UpstreamError::Transport("no script".into())))
        }
    }

    fn order(served_by: &str) -> OrderPayload {
        OrderPayload {
            order_id: 1003,
            status: "SHIPPED".into(),
            amount: 250.75,
            served_by: Some(served_by.into()),
            timestamp: None,
        }
    }

    fn refused() -> UpstreamError {
        UpstreamError::Transport("connection refused".into())
    }

    fn setup(
        primary_up: bool,
        secondary_up: bool,
    ) -> (RequestProxy<ScriptedUpstream>, Arc<RouterState>, Arc<RequestLog>, Arc<ScriptedUpstream>) {
        let state = Arc::new(RouterState::new(Replicas::new(PRIMARY, SECONDARY), true));
        state
            .liveness()
            .publish(LivenessSnapshot::new(primary_up, secondary_up, 1.0));
        let log = Arc::new(RequestLog::new(100));
        let upstream = Arc::new(ScriptedUpstream::default());
        let proxy = RequestProxy::new(state.clone(), log.clone(), upstream.clone());
        (proxy, state, log, upstream)
    }

    #[tokio::test]
    async fn test_routes_to_preferred_replica() {
        let (proxy, state, log, upstream) = setup(true, true);
        upstream.push(PRIMARY, Ok(order("Service A")));

        let routed = proxy.route_order(1003).await.unwrap();
        assert_eq!(routed.routed_to, Replica::Primary);
        assert_eq!(routed.route_reason, "Primary is UP (preferred)");
        assert_eq!(routed.note, None);

        let last = state.last_route().unwrap();
        assert_eq!(last.routed_to, Replica::Primary);

        let entries = log.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, 200);
        assert_eq!(entries[0].target.as_deref(), Some(PRIMARY));
        assert_eq!(entries[0].note, None);
    }

    #[tokio::test]
    async fn test_no_healthy_backend() {
        let (proxy, _state, log, upstream) = setup(false, false);

        let err = proxy.route_order(1).await.unwrap_err();
        assert_eq!(err, RouterError::NoHealthyBackend);
        assert_eq!(upstream.total_calls.load(Ordering::SeqCst), 0);

        let entries = log.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, 503);
        assert_eq!(entries[0].routed_to, None);
        assert_eq!(entries[0].note.as_deref(), Some("no_healthy_backend"));
    }

    #[tokio::test]
    async fn test_not_found_never_fails_over() {
        let (proxy, state, log, upstream) = setup(true, true);
        upstream.push(PRIMARY, Err(UpstreamError::Status(404)));

        let err = proxy.route_order(9999).await.unwrap_err();
        assert_eq!(err, RouterError::NotFound);
        assert_eq!(upstream.calls_to(SECONDARY), 0);
        assert_eq!(state.last_route(), None);

        let entries = log.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, 404);
        assert_eq!(entries[0].note.as_deref(), Some("not_found"));
    }

    #[tokio::test]
    async fn test_backend_error_is_bad_gateway_without_failover() {
        let (proxy, _state, log, upstream) = setup(true, true);
        upstream.push(PRIMARY, Err(UpstreamError::Status(500)));

        let err = proxy.route_order(1003).await.unwrap_err();
        assert_eq!(err, RouterError::BadGateway { status: 500 });
        assert_eq!(upstream.calls_to(SECONDARY), 0);

        let entries = log.snapshot();
        assert_eq!(entries[0].status, 500);
        assert_eq!(entries[0].note.as_deref(), Some("backend_error"));
    }

    #[tokio::test]
    async fn test_invalid_payload_is_bad_gateway() {
        let (proxy, _state, log, upstream) = setup(true, true);
        upstream.push(PRIMARY, Err(UpstreamError::InvalidPayload("expected value".into())));

        let err = proxy.route_order(1003).await.unwrap_err();
        assert_eq!(err, RouterError::BadGateway { status: 502 });
        assert_eq!(upstream.calls_to(SECONDARY), 0);
        assert_eq!(log.snapshot()[0].note.as_deref(), Some("invalid_payload"));
    }

    #[tokio::test]
    async fn test_transport_failure_fails_over_once() {
        let (proxy, state, log, upstream) = setup(true, true);
        upstream.push(PRIMARY, Err(refused()));
        upstream.push(SECONDARY, Ok(order("Service B")));

        let routed = proxy.route_order(1003).await.unwrap();
        assert_eq!(routed.routed_to, Replica::Secondary);
        assert_eq!(routed.route_reason, FAILOVER_REASON);
        assert_eq!(routed.note.as_deref(), Some(FAILOVER_NOTE));
        assert_eq!(routed.order.served_by.as_deref(), Some("Service B"));

        assert_eq!(upstream.calls_to(PRIMARY), 1);
        assert_eq!(upstream.calls_to(SECONDARY), 1);
        assert_eq!(state.last_route().unwrap().reason, FAILOVER_REASON);

        let entries = log.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, 200);
        assert_eq!(entries[0].routed_to, Some(Replica::Secondary));
        assert_eq!(entries[0].note.as_deref(), Some("immediate_failover"));
    }

    #[tokio::test]
    async fn test_timeout_with_fallback_down_makes_no_call() {
        let (proxy, _state, log, upstream) = setup(true, false);
        upstream.push(PRIMARY, Err(UpstreamError::Timeout(Duration::from_secs(1))));
        upstream.push(SECONDARY, Ok(order("Service B")));

        let err = proxy.route_order(1003).await.unwrap_err();
        assert_eq!(
            err,
            RouterError::ServiceUnavailable("Secondary is down and request failed".into())
        );
        assert_eq!(upstream.calls_to(SECONDARY), 0);
        assert_eq!(upstream.total_calls.load(Ordering::SeqCst), 1);

        let entries = log.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, 503);
        assert_eq!(entries[0].routed_to, Some(Replica::Secondary));
        assert_eq!(entries[0].note.as_deref(), Some("fallback_secondary_down"));
    }

    #[tokio::test]
    async fn test_fallback_to_primary_when_secondary_was_chosen() {
        let (proxy, _state, log, upstream) = setup(false, true);
        upstream.push(SECONDARY, Err(refused()));

        let err = proxy.route_order(1003).await.unwrap_err();
        assert_eq!(
            err,
            RouterError::ServiceUnavailable("Primary is down and request failed".into())
        );
        assert_eq!(upstream.calls_to(PRIMARY), 0);
        assert_eq!(log.snapshot()[0].note.as_deref(), Some("fallback_primary_down"));
    }

    #[tokio::test]
    async fn test_fallback_non_200() {
        let (proxy, _state, log, upstream) = setup(true, true);
        upstream.push(PRIMARY, Err(refused()));
        upstream.push(SECONDARY, Err(UpstreamError::Status(500)));

        let err = proxy.route_order(1003).await.unwrap_err();
        assert!(matches!(err, RouterError::ServiceUnavailable(_)));

        let entries = log.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, 500);
        assert_eq!(entries[0].note.as_deref(), Some("fallback_non_200"));
    }

    #[tokio::test]
    async fn test_fallback_transport_failure() {
        let (proxy, state, log, upstream) = setup(true, true);
        upstream.push(PRIMARY, Err(refused()));
        upstream.push(SECONDARY, Err(UpstreamError::Timeout(Duration::from_secs(1))));

        let err = proxy.route_order(1003).await.unwrap_err();
        assert_eq!(err, RouterError::ServiceUnavailable("Failover attempt failed".into()));
        assert_eq!(upstream.total_calls.load(Ordering::SeqCst), 2);
        assert_eq!(state.last_route(), None);

        let entries = log.snapshot();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, 503);
        assert_eq!(entries[0].note.as_deref(), Some("fallback_exception"));
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("secondary"), "Secondary");
        assert_eq!(capitalize(""), "");
    }
}
