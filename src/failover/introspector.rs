//! Client list introspection.
//!
//! # Responsibilities
//! - Read the store's client list over the current connection
//! - Count the sessions of one host that are executing `subscribe`
//!
//! # Design Decisions
//! - Read-only: a single `CLIENT LIST` per evaluation
//! - Query failures are returned to the caller, never folded into a count

use crate::failover::host::HostId;
use crate::store::{ClientSession, StoreConnection, StoreResult};

/// Reads client sessions and attributes them to hosts.
#[derive(Debug, Clone)]
pub struct ClientIntrospector {
    local_host: HostId,
}

impl ClientIntrospector {
    pub fn new(local_host: HostId) -> Self {
        Self { local_host }
    }

    /// The identifier this host's sessions are registered under.
    pub fn local_host(&self) -> &HostId {
        &self.local_host
    }

    /// Every client session the store currently knows about.
    pub async fn sessions(
        &self,
        connection: &dyn StoreConnection,
    ) -> StoreResult<Vec<ClientSession>> {
        connection.client_list().await
    }

    /// Number of sessions owned by `host` that are currently subscribing.
    pub async fn subscriber_count(
        &self,
        connection: &dyn StoreConnection,
        host: &HostId,
    ) -> StoreResult<usize> {
        let sessions = self.sessions(connection).await?;
        Ok(count_subscribers(&sessions, host))
    }
}

/// Count sessions with `name == host` and `cmd == "subscribe"`.
pub fn count_subscribers(sessions: &[ClientSession], host: &HostId) -> usize {
    sessions
        .iter()
        .filter(|s| s.host() == host.as_str() && s.is_subscribing())
        .count()
}
