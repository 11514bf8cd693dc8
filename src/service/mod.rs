//! Simulated order service.
//!
//! Stands in for a backend replica in demos and integration tests. It serves a
//! fixed order catalogue and exposes a manual failure switch: while failed, both
//! `/health` and `/orders/{id}` answer 500, which is what the router's health
//! monitor and proxy react to.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::net::TcpListener;

use crate::clock::{unix_now, Timestamp};
use crate::order::OrderPayload;

/// Order service settings.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Name reported in `served_by` and `/health`.
    pub name: String,
    /// Delay added to `/health` and `/orders/{id}`.
    pub simulated_latency: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "Service".to_string(),
            simulated_latency: Duration::ZERO,
        }
    }
}

/// State of the manual failure switch.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FailureState {
    pub failed: bool,
    pub since_ts: Option<Timestamp>,
    pub reason: Option<String>,
}

#[derive(Debug)]
struct ServiceState {
    config: ServiceConfig,
    failure: Mutex<FailureState>,
}

impl ServiceState {
    fn failure(&self) -> MutexGuard<'_, FailureState> {
        self.failure.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle onto a running service, for flipping the failure switch in-process.
#[derive(Debug, Clone)]
pub struct OrderService {
    state: Arc<ServiceState>,
}

impl OrderService {
    pub fn new(config: ServiceConfig) -> Self {
        Self {
            state: Arc::new(ServiceState {
                config,
                failure: Mutex::new(FailureState::default()),
            }),
        }
    }

    pub fn fail(&self, reason: &str) {
        *self.state.failure() = FailureState {
            failed: true,
            since_ts: Some(unix_now()),
            reason: Some(reason.to_string()),
        };
        tracing::warn!(service = %self.state.config.name, reason, "Simulated failure injected");
    }

    pub fn recover(&self) {
        *self.state.failure() = FailureState::default();
        tracing::info!(service = %self.state.config.name, "Simulated failure cleared");
    }

    pub fn failure_state(&self) -> FailureState {
        self.state.failure().clone()
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(home))
            .route("/health", get(health))
            .route("/info", get(info))
            .route("/orders/{order_id}", get(get_order))
            .route("/stimulus/fail", post(stimulus_fail))
            .route("/stimulus/recover", post(stimulus_recover))
            .route("/stimulus/status", get(stimulus_status))
            .with_state(self.clone())
    }

    /// Serve on `listener` until `shutdown` resolves.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> std::io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tracing::info!(
            address = %listener.local_addr()?,
            service = %self.state.config.name,
            latency_ms = self.state.config.simulated_latency.as_millis() as u64,
            "Order service listening"
        );
        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown)
            .await
    }
}

/// The fixed catalogue.
pub fn catalogue(order_id: i64) -> Option<OrderPayload> {
    let (status, amount) = match order_id {
        1001 => ("CREATED", 59.99),
        1002 => ("PAID", 120.00),
        1003 => ("SHIPPED", 250.75),
        _ => return None,
    };
    Some(OrderPayload {
        order_id,
        status: status.to_string(),
        amount,
        served_by: None,
        timestamp: None,
    })
}

async fn simulate_latency(service: &OrderService) {
    let latency = service.state.config.simulated_latency;
    if !latency.is_zero() {
        tokio::time::sleep(latency).await;
    }
}

fn simulated_failure(service: &OrderService) -> Option<Response> {
    let failure = service.failure_state();
    if !failure.failed {
        return None;
    }
    let body = json!({
        "detail": {
            "message": "Simulated failure",
            "service": service.state.config.name,
            "since_ts": failure.since_ts,
            "reason": failure.reason,
        }
    });
    Some((StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response())
}

async fn home(State(service): State<OrderService>) -> Json<serde_json::Value> {
    Json(json!({
        "message": format!("{} OK", service.state.config.name),
        "try": ["/health", "/info", "/orders/1003", "/stimulus/status"],
    }))
}

async fn health(State(service): State<OrderService>) -> Response {
    simulate_latency(&service).await;
    if let Some(failure) = simulated_failure(&service) {
        return failure;
    }
    Json(json!({
        "status": "UP",
        "service": service.state.config.name,
        "timestamp": unix_now(),
    }))
    .into_response()
}

async fn info(State(service): State<OrderService>) -> Json<serde_json::Value> {
    Json(json!({
        "service": service.state.config.name,
        "simulated_latency_ms": service.state.config.simulated_latency.as_millis() as u64,
        "endpoints": [
            "/",
            "/health",
            "/info",
            "/orders/{order_id}",
            "/stimulus/fail",
            "/stimulus/recover",
            "/stimulus/status",
        ],
    }))
}

async fn get_order(State(service): State<OrderService>, Path(order_id): Path<i64>) -> Response {
    simulate_latency(&service).await;
    if let Some(failure) = simulated_failure(&service) {
        return failure;
    }
    match catalogue(order_id) {
        Some(mut order) => {
            order.served_by = Some(service.state.config.name.clone());
            order.timestamp = Some(unix_now());
            Json(order).into_response()
        }
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "detail": "Order not found" })),
        )
            .into_response(),
    }
}

#[derive(Debug, Deserialize)]
struct FailParams {
    #[serde(default = "default_reason")]
    reason: String,
}

fn default_reason() -> String {
    "manual".to_string()
}

#[derive(Debug, Serialize)]
struct StimulusStatus {
    service: String,
    #[serde(flatten)]
    failure: FailureState,
}

#[derive(Debug, Serialize)]
struct StimulusAck {
    ok: bool,
    #[serde(flatten)]
    status: StimulusStatus,
}

fn stimulus_status_of(service: &OrderService) -> StimulusStatus {
    StimulusStatus {
        service: service.state.config.name.clone(),
        failure: service.failure_state(),
    }
}

async fn stimulus_status(State(service): State<OrderService>) -> Json<StimulusStatus> {
    Json(stimulus_status_of(&service))
}

async fn stimulus_fail(
    State(service): State<OrderService>,
    Query(params): Query<FailParams>,
) -> Json<StimulusAck> {
    service.fail(&params.reason);
    Json(StimulusAck {
        ok: true,
        status: stimulus_status_of(&service),
    })
}

async fn stimulus_recover(State(service): State<OrderService>) -> Json<StimulusAck> {
    service.recover();
    Json(StimulusAck {
        ok: true,
        status: stimulus_status_of(&service),
    })
}
