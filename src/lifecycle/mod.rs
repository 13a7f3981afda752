//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Resolve host → Build store manager → Orchestrator
//!     → Initial subscribe → Start check loop
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Latch flag → Check loop exits → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then identity, then store
//! - A tick in progress finishes (bounded by its timeout) before the loop exits

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownListener};
