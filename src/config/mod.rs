//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → GuardConfig (validated, immutable)
//!     → consumed once at startup
//!
//! On every tick:
//!     flag.rs reads the on/off switch from the environment
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; only the on/off switch is live
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod flag;
pub mod loader;
pub mod schema;
pub mod validation;

pub use flag::{EnvFlag, FeatureFlag};
pub use schema::GuardConfig;
pub use schema::StoreConfig;
pub use schema::FailoverConfig;
pub use schema::ObservabilityConfig;
