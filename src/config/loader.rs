//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use crate::config::schema::RouterConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for environment variable {var}")]
    Env { var: &'static str, value: String },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: optional TOML file, then environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<RouterConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => RouterConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply the environment-style overrides to `config`.
///
/// `lookup` abstracts the environment so tests do not mutate process state.
pub fn apply_env_overrides<F>(config: &mut RouterConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("PRIMARY_URL") {
        config.replicas.primary_url = url;
    }
    if let Some(url) = lookup("SECONDARY_URL") {
        config.replicas.secondary_url = url;
    }
    if let Some(value) = lookup("HEALTH_INTERVAL_SECONDS") {
        config.health_check.interval_secs = parse_var("HEALTH_INTERVAL_SECONDS", value)?;
    }
    if let Some(value) = lookup("REQUEST_TIMEOUT_SECONDS") {
        config.health_check.request_timeout_secs = parse_var("REQUEST_TIMEOUT_SECONDS", value)?;
    }
    if let Some(value) = lookup("PREFER_PRIMARY") {
        config.routing.prefer_primary = value.trim().eq_ignore_ascii_case("true");
    }
    if let Some(value) = lookup("REQUEST_LOG_MAX") {
        config.request_log.capacity = parse_var("REQUEST_LOG_MAX", value)?;
    }
    if let Some(addr) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = addr;
    }

    // Replica URLs are joined with absolute paths.
    trim_trailing_slash(&mut config.replicas.primary_url);
    trim_trailing_slash(&mut config.replicas.secondary_url);

    Ok(())
}

fn parse_var<T: FromStr>(var: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Env { var, value })
}

fn trim_trailing_slash(url: &mut String) {
    while url.ends_with('/') {
        url.pop();
    }
}
