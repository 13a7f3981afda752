//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! failover check produces:
//!     → logging.rs (structured log events)
//!     → metrics.rs (tick and recovery counters, gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape, optional)
//! ```
//!
//! # Design Decisions
//! - A confirmed failover logs at WARN; an unreadable client list logs at WARN
//!   with a distinct message; failed recovery logs at ERROR
//! - Healthy ticks log at DEBUG so steady state stays quiet

pub mod logging;
pub mod metrics;
