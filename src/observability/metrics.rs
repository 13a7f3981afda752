//! Metrics collection and exposition.
//!
//! # Metrics
//! - `failover_guard_ticks_total` (counter): ticks by outcome
//!   (disabled, healthy, recovered, indeterminate, recovery_failed, timed_out)
//! - `failover_guard_recoveries_total` (counter): recovery attempts by result
//! - `failover_guard_local_subscribers` (gauge): subscribe sessions of this host
//! - `failover_guard_connection_generation` (gauge): generation of the live connection
//!
//! Without an installed recorder every call is a no-op.

use std::net::SocketAddr;

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder and its scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_tick(outcome: &'static str) {
    counter!("failover_guard_ticks_total", "outcome" => outcome).increment(1);
}

pub fn record_recovery(success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("failover_guard_recoveries_total", "result" => result).increment(1);
}

pub fn record_local_subscribers(count: usize) {
    gauge!("failover_guard_local_subscribers").set(count as f64);
}

pub fn record_connection_generation(generation: u64) {
    gauge!("failover_guard_connection_generation").set(generation as f64);
}
