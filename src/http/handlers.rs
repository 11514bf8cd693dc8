//! Router endpoint handlers.
//!
//! Handlers are thin: they read `AppState`, call into the proxy, the metrics
//! engine or the upstream client, and shape JSON. Failures are `RouterError`s
//! and are rendered by `http::response`.

use axum::{
    extract::{Path, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::clock::unix_now;
use crate::error::{RouterError, UpstreamError};
use crate::http::request::request_id_of;
use crate::http::server::AppState;
use crate::measurement::MetricsReport;
use crate::order::RoutedOrder;
use crate::routing::Replica;

#[derive(Debug, Serialize)]
pub struct LogStats {
    pub size: usize,
    pub max: usize,
}

fn log_stats(app: &AppState) -> LogStats {
    LogStats {
        size: app.log.len(),
        max: app.log.capacity(),
    }
}

pub async fn home() -> Json<Value> {
    Json(json!({
        "message": "Failover router OK",
        "try": [
            "/status",
            "/health",
            "/route",
            "/orders/1001",
            "/metrics",
            "/stimulus/fail-primary",
            "/stimulus/recover-primary",
            "/stimulus/reset-metrics",
        ],
    }))
}

pub async fn status(State(app): State<AppState>) -> Json<Value> {
    let state = &app.state;
    let decision = state.decide();
    let injection = state.failure_injection();

    Json(json!({
        "primary": state.replica_state(Replica::Primary),
        "secondary": state.replica_state(Replica::Secondary),
        "prefer_primary": state.prefer_primary(),
        "decision": {
            "routed_to": decision.replica(),
            "reason": decision.reason(),
        },
        "last_route": state.last_route(),
        "last_checked_at": state.liveness().snapshot().checked_at,
        "failure_injected_at_ts": injection.map(|i| i.injected_at),
        "failure_injected_target": injection.map(|i| i.target),
        "request_log": log_stats(&app),
    }))
}

pub async fn router_health(State(app): State<AppState>) -> Json<Value> {
    let snapshot = app.state.liveness().snapshot();
    Json(json!({
        "status": "UP",
        "primary_up": snapshot.primary_up,
        "secondary_up": snapshot.secondary_up,
        "health_interval_s": app.health.interval_secs,
        "request_timeout_s": app.health.request_timeout_secs,
        "prefer_primary": app.state.prefer_primary(),
        "last_checked_at": snapshot.checked_at,
        "last_route": app.state.last_route(),
    }))
}

#[derive(Debug, Serialize)]
pub struct RouteInfo {
    pub target: String,
    pub routed_to: Option<Replica>,
    pub reason: &'static str,
}

/// Current routing decision. No backend I/O.
pub async fn route_info(State(app): State<AppState>) -> Json<RouteInfo> {
    let decision = app.state.decide();
    let routed_to = decision.replica();
    Json(RouteInfo {
        target: routed_to
            .map(|r| app.state.replicas().url(r).to_string())
            .unwrap_or_default(),
        routed_to,
        reason: decision.reason(),
    })
}

pub async fn get_order(
    State(app): State<AppState>,
    Path(order_id): Path<i64>,
    headers: HeaderMap,
) -> Result<Json<RoutedOrder>, RouterError> {
    tracing::debug!(request_id = %request_id_of(&headers), order_id, "Order lookup");

    // Runs to completion even if the client goes away or the inbound timeout
    // fires, so every lookup leaves exactly one log entry.
    let proxy = app.proxy.clone();
    let routed = tokio::spawn(async move { proxy.route_order(order_id).await })
        .await
        .map_err(|e| {
            tracing::error!(order_id, error = %e, "Order routing task failed");
            RouterError::ServiceUnavailable("Order routing task failed".to_string())
        })?;
    routed.map(Json)
}

#[derive(Debug, Deserialize)]
pub struct MetricsParams {
    #[serde(default = "default_pre_window")]
    pub pre_window_s: f64,
    #[serde(default = "default_post_window")]
    pub post_window_s: f64,
}

fn default_pre_window() -> f64 {
    2.0
}

fn default_post_window() -> f64 {
    10.0
}

#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    #[serde(flatten)]
    pub report: MetricsReport,
    pub request_log: LogStats,
}

pub async fn metrics(
    State(app): State<AppState>,
    Query(params): Query<MetricsParams>,
) -> Result<Json<MetricsResponse>, RouterError> {
    let report = app.metrics.compute(params.pre_window_s, params.post_window_s)?;
    Ok(Json(MetricsResponse {
        report,
        request_log: log_stats(&app),
    }))
}

#[derive(Debug, Deserialize)]
pub struct FailParams {
    #[serde(default = "default_reason")]
    pub reason: String,
}

fn default_reason() -> String {
    "manual".to_string()
}

fn stimulus_error(action: &str, source: UpstreamError) -> RouterError {
    let message = match &source {
        UpstreamError::Status(status) => {
            format!("Primary rejected stimulus/{action} (status {status})")
        }
        other => format!("Primary unreachable for stimulus/{action}: {other}"),
    };
    tracing::warn!(action, error = %source, "Stimulus call failed");
    RouterError::Stimulus { message, source }
}

pub async fn stimulus_fail_primary(
    State(app): State<AppState>,
    Query(params): Query<FailParams>,
) -> Result<Json<Value>, RouterError> {
    let primary = app.state.replicas().url(Replica::Primary);
    let response = app
        .upstream
        .post_stimulus(primary, "fail", Some(&params.reason))
        .await
        .map_err(|e| stimulus_error("fail", e))?;

    let injected_at = unix_now();
    app.state.mark_failure_injected(Replica::Primary, injected_at);
    tracing::warn!(injected_at, reason = %params.reason, "Failure injected on primary");

    Ok(Json(json!({
        "ok": true,
        "injected_at_ts": injected_at,
        "target": Replica::Primary,
        "primary_response": response,
        "next": "Send traffic to /orders/{id}, then read /metrics",
    })))
}

pub async fn stimulus_recover_primary(State(app): State<AppState>) -> Result<Json<Value>, RouterError> {
    let primary = app.state.replicas().url(Replica::Primary);
    let response = app
        .upstream
        .post_stimulus(primary, "recover", None)
        .await
        .map_err(|e| stimulus_error("recover", e))?;

    tracing::info!("Primary recovery requested");
    Ok(Json(json!({
        "ok": true,
        "primary_response": response,
    })))
}

/// Clear the request log and the injection markers. Idempotent.
pub async fn reset_metrics(State(app): State<AppState>) -> Json<Value> {
    app.log.clear();
    app.state.clear_failure_injection();
    tracing::info!("Request log and failure injection markers cleared");
    Json(json!({
        "ok": true,
        "request_log": log_stats(&app),
    }))
}
