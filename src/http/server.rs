//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build the shared router state from `RouterConfig`
//! - Create the Axum Router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Start the health monitor and serve until shutdown

use std::sync::Arc;
use std::time::Duration;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{HealthCheckConfig, RouterConfig};
use crate::health::HealthMonitor;
use crate::http::handlers;
use crate::http::request::{request_id_header, UuidRequestId};
use crate::lifecycle::Shutdown;
use crate::measurement::{MetricsEngine, RequestLog};
use crate::proxy::{HttpUpstream, RequestProxy};
use crate::routing::{Replica, Replicas};
use crate::state::RouterState;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub state: Arc<RouterState>,
    pub log: Arc<RequestLog>,
    pub proxy: RequestProxy<HttpUpstream>,
    pub metrics: MetricsEngine,
    pub upstream: Arc<HttpUpstream>,
    pub health: HealthCheckConfig,
}

/// HTTP server for the failover router.
pub struct HttpServer {
    router: Router,
    app: AppState,
    config: RouterConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration.
    pub fn new(config: RouterConfig) -> Result<Self, reqwest::Error> {
        let state = Arc::new(RouterState::new(
            Replicas::from_config(&config.replicas),
            config.routing.prefer_primary,
        ));
        let log = Arc::new(RequestLog::new(config.request_log.capacity));
        let upstream = Arc::new(HttpUpstream::new(config.health_check.request_timeout())?);

        let app = AppState {
            proxy: RequestProxy::new(state.clone(), log.clone(), upstream.clone()),
            metrics: MetricsEngine::new(state.clone(), log.clone()),
            state,
            log,
            upstream,
            health: config.health_check.clone(),
        };

        let router = Self::build_router(&config, app.clone());
        Ok(Self { router, app, config })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RouterConfig, app: AppState) -> Router {
        Router::new()
            .route("/", get(handlers::home))
            .route("/status", get(handlers::status))
            .route("/health", get(handlers::router_health))
            .route("/route", get(handlers::route_info))
            .route("/orders/{order_id}", get(handlers::get_order))
            .route("/metrics", get(handlers::metrics))
            .route("/stimulus/fail-primary", post(handlers::stimulus_fail_primary))
            .route("/stimulus/recover-primary", post(handlers::stimulus_recover_primary))
            .route("/stimulus/reset-metrics", post(handlers::reset_metrics))
            .with_state(app)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::new(request_id_header()))
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::new(request_id_header(), UuidRequestId))
    }

    /// The fully layered router, for driving requests without a socket.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn state(&self) -> &Arc<RouterState> {
        &self.app.state
    }

    pub fn request_log(&self) -> &Arc<RequestLog> {
        &self.app.log
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Run the server on `listener` until `shutdown` fires.
    ///
    /// The health monitor is started first and stopped after the listener has
    /// drained.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            primary = %self.app.state.replicas().url(Replica::Primary),
            secondary = %self.app.state.replicas().url(Replica::Secondary),
            prefer_primary = self.app.state.prefer_primary(),
            "HTTP server starting"
        );

        let monitor = HealthMonitor::new(
            self.app.state.clone(),
            self.app.upstream.clone(),
            self.config.health_check.interval(),
        )
        .spawn(shutdown.subscribe());

        let mut stop = shutdown.subscribe();
        let served = axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                stop.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        // Stop the monitor even when serve ended on its own.
        shutdown.trigger();
        if let Err(e) = monitor.await {
            tracing::error!(error = %e, "Health monitor task failed");
        }

        served?;
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
