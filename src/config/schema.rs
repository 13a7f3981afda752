//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the guard.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the failover guard.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GuardConfig {
    /// Store connection settings.
    pub store: StoreConfig,

    /// Failover check settings.
    pub failover: FailoverConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Store connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Store URL (e.g., "redis://:password@10.0.0.9:6379/0").
    pub url: String,

    /// Socket connect timeout in milliseconds.
    pub connect_timeout_ms: u64,

    /// Per-command timeout in milliseconds.
    pub command_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            connect_timeout_ms: 2000,
            command_timeout_ms: 2000,
        }
    }
}

/// Failover check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct FailoverConfig {
    /// Environment variable holding the on/off switch ("Y" enables).
    /// Read on every tick.
    pub enabled_env: String,

    /// Channel this process subscribes to and restores after failover.
    pub channel: String,

    /// Interval between checks in milliseconds.
    pub check_interval_ms: u64,

    /// Upper bound for one check, including recovery, in milliseconds.
    pub tick_timeout_ms: u64,

    /// Host identifier override. The OS hostname is used when unset.
    pub host_id: Option<String>,
}

impl FailoverConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }

    pub fn tick_timeout(&self) -> Duration {
        Duration::from_millis(self.tick_timeout_ms)
    }
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            enabled_env: "ENABLED_FAILOVER_CHECK".to_string(),
            channel: "messageQueue".to_string(),
            check_interval_ms: 3000,
            tick_timeout_ms: 10_000,
            host_id: None,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
