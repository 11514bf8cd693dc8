//! HTTP client for the replicas.
//!
//! # Responsibilities
//! - Probe `GET /health` (see `health::probe`)
//! - Fetch `GET /orders/{id}` and classify the outcome
//! - Drive the primary's `/stimulus/*` endpoints
//!
//! # Design Decisions
//! - One shared `reqwest::Client` (connection pooling), proxies disabled
//! - Every call is bounded by `with_deadline(T_req)`

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::error::UpstreamError;
use crate::health::probe;
use crate::order::OrderPayload;
use crate::proxy::Upstream;
use crate::resilience::timeouts::with_deadline;

/// Production [`Upstream`] backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpUpstream {
    client: Client,
    timeout: Duration,
}

impl HttpUpstream {
    /// Create a client whose every call is bounded by `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .no_proxy()
            .user_agent(concat!("failover-router/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// `POST {base_url}/stimulus/{action}`; returns the replica's JSON body.
    pub async fn post_stimulus(
        &self,
        base_url: &str,
        action: &str,
        reason: Option<&str>,
    ) -> Result<Value, UpstreamError> {
        let url = format!("{base_url}/stimulus/{action}");
        with_deadline(self.timeout, async {
            let mut request = self.client.post(&url);
            if let Some(reason) = reason {
                request = request.query(&[("reason", reason)]);
            }
            let response = request.send().await?;
            let status = response.status();
            if status != StatusCode::OK {
                return Err(UpstreamError::Status(status.as_u16()));
            }
            let body = response.bytes().await?;
            Ok(serde_json::from_slice(&body).unwrap_or(Value::Null))
        })
        .await
    }
}

impl Upstream for HttpUpstream {
    async fn check_health(&self, base_url: &str) -> bool {
        probe::probe(&self.client, base_url, self.timeout).await
    }

    async fn get_order(&self, base_url: &str, order_id: i64) -> Result<OrderPayload, UpstreamError> {
        let url = format!("{base_url}/orders/{order_id}");
        with_deadline(self.timeout, async {
            let response = self.client.get(&url).send().await?;
            let status = response.status();
            if status != StatusCode::OK {
                return Err(UpstreamError::Status(status.as_u16()));
            }
            let body = response.bytes().await?;
            serde_json::from_slice(&body).map_err(|e| UpstreamError::InvalidPayload(e.to_string()))
        })
        .await
    }
}
