//! Failover inference.
//!
//! The store gives no event when its standby takes over; the only visible
//! symptom is that this host's subscribe session is gone. The rule:
//!
//! ```text
//! local subscribers == 0  → FailedOver
//! local subscribers  > 0  → Healthy
//! query failed            → Indeterminate (never treated as failover)
//! ```
//!
//! The detector keeps no state between evaluations.

use std::sync::Arc;

use crate::failover::introspector::ClientIntrospector;
use crate::store::{ConnectionManager, StoreError, StoreResult};

/// Result of one evaluation.
#[derive(Debug)]
pub enum Detection {
    /// This host holds at least one subscribe session.
    Healthy { subscribers: usize },
    /// No subscribe session for this host: the subscription was dropped.
    FailedOver,
    /// The client list could not be read; state unknown this cycle.
    Indeterminate(StoreError),
}

impl Detection {
    pub fn is_failed_over(&self) -> bool {
        matches!(self, Detection::FailedOver)
    }
}

/// Decides whether this host's subscription has been silently dropped.
pub struct FailoverDetector {
    introspector: ClientIntrospector,
    connections: Arc<ConnectionManager>,
}

impl FailoverDetector {
    pub fn new(introspector: ClientIntrospector, connections: Arc<ConnectionManager>) -> Self {
        Self {
            introspector,
            connections,
        }
    }

    pub fn introspector(&self) -> &ClientIntrospector {
        &self.introspector
    }

    /// Evaluate the inference rule against the current connection.
    pub async fn evaluate(&self) -> Detection {
        let connection = match self.connections.connection().await {
            Ok(connection) => connection,
            Err(e) => return Detection::Indeterminate(e),
        };

        let host = self.introspector.local_host();
        match self.introspector.subscriber_count(&**connection, host).await {
            Ok(0) => Detection::FailedOver,
            Ok(subscribers) => Detection::Healthy { subscribers },
            Err(e) => Detection::Indeterminate(e),
        }
    }

    /// `false` when `enabled` is off (no store query); otherwise whether this
    /// host has zero subscribe sessions. Query errors are returned, not guessed.
    pub async fn is_failed_over(&self, enabled: bool) -> StoreResult<bool> {
        if !enabled {
            return Ok(false);
        }

        match self.evaluate().await {
            Detection::FailedOver => Ok(true),
            Detection::Healthy { .. } => Ok(false),
            Detection::Indeterminate(e) => Err(e),
        }
    }
}
