//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals and timeouts > 0)
//! - Check the store URL and metrics address parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GuardConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GuardConfig;
use crate::store::parse_store_url;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &GuardConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = parse_store_url(&config.store.url) {
        errors.push(ValidationError::new("store.url", e.to_string()));
    }
    if config.store.connect_timeout_ms == 0 {
        errors.push(ValidationError::new("store.connect_timeout_ms", "must be greater than 0"));
    }
    if config.store.command_timeout_ms == 0 {
        errors.push(ValidationError::new("store.command_timeout_ms", "must be greater than 0"));
    }

    let failover = &config.failover;
    if failover.enabled_env.trim().is_empty() {
        errors.push(ValidationError::new("failover.enabled_env", "must not be empty"));
    }
    if failover.channel.trim().is_empty() {
        errors.push(ValidationError::new("failover.channel", "must not be empty"));
    }
    if failover.check_interval_ms == 0 {
        errors.push(ValidationError::new("failover.check_interval_ms", "must be greater than 0"));
    }
    if failover.tick_timeout_ms == 0 {
        errors.push(ValidationError::new("failover.tick_timeout_ms", "must be greater than 0"));
    }
    if let Some(host) = &failover.host_id {
        if host.is_empty() || host.contains(char::is_whitespace) {
            errors.push(ValidationError::new(
                "failover.host_id",
                "must be non-empty and contain no whitespace",
            ));
        }
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
