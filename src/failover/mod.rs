//! Failover detection and subscription recovery.
//!
//! # Data Flow
//! ```text
//! orchestrator.rs (fixed interval)
//!     → on/off switch (re-read every tick)
//!     → detector.rs
//!         → introspector.rs: CLIENT LIST → count {name == host, cmd == subscribe}
//!     → FailedOver:    reset → connect → subscribe (store::ConnectionManager)
//!     → Healthy:       nothing
//!     → Indeterminate: log, retry next tick
//! ```
//!
//! # Design Decisions
//! - Failover is inferred; the store never announces it
//! - Host identity is resolved once at startup (host.rs)
//! - Query errors are never read as failover
//! - Recovery is idempotent and retried from scratch every tick

pub mod detector;
pub mod host;
pub mod introspector;
pub mod orchestrator;
pub mod subscription;

pub use detector::{Detection, FailoverDetector};
pub use host::{HostId, HostResolutionError};
pub use introspector::ClientIntrospector;
pub use orchestrator::{CheckSettings, RecoveryOrchestrator, RecoveryState, TickError, TickOutcome};
pub use subscription::SubscriptionDescriptor;
