//! Failover guard for an active-standby store's pub/sub subscription.

pub mod config;
pub mod failover;
pub mod lifecycle;
pub mod observability;
pub mod store;

pub use config::schema::GuardConfig;
pub use failover::RecoveryOrchestrator;
pub use lifecycle::Shutdown;
