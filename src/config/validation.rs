//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (interval and timeout > 0, capacity > 0)
//! - The inbound request ceiling must fit two upstream attempts
//! - Check that both replica URLs are usable and distinct
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RouterConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::config::schema::RouterConfig;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid URL '{value}': {reason}")]
    InvalidUrl {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("{field}: must be a representable duration greater than zero seconds (got {value})")]
    NotPositive { field: &'static str, value: f64 },

    #[error(
        "timeouts.request_secs ({request_secs}) must cover a primary attempt and one failover \
         attempt ({required}s)"
    )]
    RequestCeilingTooShort { request_secs: u64, required: f64 },

    #[error("request_log.capacity must be greater than zero")]
    ZeroCapacity,

    #[error("replicas.primary_url and replicas.secondary_url must differ")]
    SameReplica,

    #[error("{field}: invalid socket address '{value}'")]
    InvalidAddress { field: &'static str, value: String },
}

/// Validate a loaded configuration, collecting every problem found.
pub fn validate_config(config: &RouterConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url("replicas.primary_url", &config.replicas.primary_url, &mut errors);
    check_url("replicas.secondary_url", &config.replicas.secondary_url, &mut errors);
    if config.replicas.primary_url == config.replicas.secondary_url {
        errors.push(ValidationError::SameReplica);
    }

    check_positive("health_check.interval_secs", config.health_check.interval_secs, &mut errors);
    check_positive(
        "health_check.request_timeout_secs",
        config.health_check.request_timeout_secs,
        &mut errors,
    );
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::NotPositive {
            field: "timeouts.request_secs",
            value: 0.0,
        });
    }
    let attempt = config.health_check.request_timeout_secs;
    if is_duration(attempt) && (config.timeouts.request_secs as f64) < 2.0 * attempt {
        errors.push(ValidationError::RequestCeilingTooShort {
            request_secs: config.timeouts.request_secs,
            required: 2.0 * attempt,
        });
    }

    if config.request_log.capacity == 0 {
        errors.push(ValidationError::ZeroCapacity);
    }

    check_address("listener.bind_address", &config.listener.bind_address, &mut errors);
    if config.observability.metrics_enabled {
        check_address(
            "observability.metrics_address",
            &config.observability.metrics_address,
            &mut errors,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    match Url::parse(value) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        Ok(url) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }),
        Err(e) => errors.push(ValidationError::InvalidUrl {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}

fn is_duration(secs: f64) -> bool {
    secs > 0.0 && Duration::try_from_secs_f64(secs).is_ok()
}

fn check_positive(field: &'static str, value: f64, errors: &mut Vec<ValidationError>) {
    if !is_duration(value) {
        errors.push(ValidationError::NotPositive { field, value });
    }
}

fn check_address(field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
