//! Single health probe against one replica.
//!
//! # Responsibilities
//! - Issue `GET {base_url}/health` with the request deadline
//! - Collapse every failure mode (timeout, transport, status, body) to `false`
//!
//! # Design Decisions
//! - Callers only see a boolean; the failure reason goes to the debug log

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::resilience::timeouts::with_deadline;

#[derive(Debug, Deserialize)]
struct HealthBody {
    status: String,
}

/// Why a probe did not count as "up".
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeVerdict {
    Up,
    NonSuccessStatus(StatusCode),
    MalformedBody(String),
    NotUp(String),
}

/// Classify a received health response.
pub fn classify(status: StatusCode, body: &[u8]) -> ProbeVerdict {
    if !status.is_success() {
        return ProbeVerdict::NonSuccessStatus(status);
    }
    match serde_json::from_slice::<HealthBody>(body) {
        Ok(health) if health.status == "UP" => ProbeVerdict::Up,
        Ok(health) => ProbeVerdict::NotUp(health.status),
        Err(e) => ProbeVerdict::MalformedBody(e.to_string()),
    }
}

/// Probe one replica. True iff it reported "UP" within `timeout`.
pub async fn probe(client: &Client, base_url: &str, timeout: Duration) -> bool {
    let url = format!("{base_url}/health");
    let received = with_deadline(timeout, async {
        let response = client.get(&url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        Ok::<_, reqwest::Error>((status, body))
    })
    .await;

    match received {
        Ok((status, body)) => match classify(status, &body) {
            ProbeVerdict::Up => true,
            verdict => {
                tracing::debug!(url = %url, verdict = ?verdict, "Health check failed");
                false
            }
        },
        Err(e) => {
            tracing::debug!(url = %url, error = %e, "Health check failed");
            false
        }
    }
}
