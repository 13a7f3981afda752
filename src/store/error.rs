//! Store error definitions.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while talking to the store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Failure reported by the store client: I/O, error replies, bad replies.
    #[error("store client error: {0}")]
    Client(#[from] redis::RedisError),

    /// Operation did not complete within the configured deadline.
    #[error("store operation timed out after {0:?}")]
    Timeout(Duration),

    /// The configured store address could not be used.
    #[error("invalid store address: {0}")]
    InvalidAddress(String),
}

impl StoreError {
    /// True when the connection that produced this error can no longer be trusted.
    pub fn is_connection_fault(&self) -> bool {
        match self {
            StoreError::Client(e) => {
                e.is_io_error()
                    || e.is_connection_dropped()
                    || e.is_connection_refusal()
                    || e.is_timeout()
            }
            StoreError::Timeout(_) => true,
            StoreError::InvalidAddress(_) => false,
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
