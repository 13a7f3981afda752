//! Runtime on/off switch for the failover check.
//!
//! The switch is re-read on every tick so operators can toggle it without a
//! restart. Only the literal value `"Y"` enables the check.

use std::sync::atomic::{AtomicBool, Ordering};

/// Value that turns the check on.
pub const ENABLED_VALUE: &str = "Y";

/// A switch consulted at the start of every tick.
pub trait FeatureFlag: Send + Sync {
    fn is_enabled(&self) -> bool;
}

/// Interpret a raw flag value. Absent or anything other than `"Y"` is off.
pub fn is_enabled_value(value: Option<&str>) -> bool {
    value == Some(ENABLED_VALUE)
}

/// Flag backed by an environment variable.
#[derive(Debug, Clone)]
pub struct EnvFlag {
    var: String,
}

impl EnvFlag {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }

    pub fn var(&self) -> &str {
        &self.var
    }
}

impl FeatureFlag for EnvFlag {
    fn is_enabled(&self) -> bool {
        is_enabled_value(std::env::var(&self.var).ok().as_deref())
    }
}

impl FeatureFlag for AtomicBool {
    fn is_enabled(&self) -> bool {
        self.load(Ordering::SeqCst)
    }
}
