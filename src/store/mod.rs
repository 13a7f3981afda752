//! Store connection subsystem.
//!
//! # Data Flow
//! ```text
//! ConnectionFactory::connect()
//!     → StoreConnection (command socket, named after this host)
//!     → wrapped in ConnectionHandle { generation }
//!     → published by ConnectionManager (atomic pointer swap)
//!
//! Detection:   manager.connection() → client_list() → client_list.rs parser
//! Recovery:    manager.replace_subscribed(channel)
//!                  → reset → connect → subscribe → install
//! ```
//!
//! # Design Decisions
//! - The failover core only sees the traits below; the `redis` adapter is one implementation
//! - At most one handle is installed at any time; replacement is a single swap
//! - Every store call is bounded by a timeout in the adapter

use async_trait::async_trait;
use tokio::sync::mpsc;

pub mod client_list;
pub mod connection;
pub mod error;
pub mod manager;

pub use client_list::ClientSession;
pub use connection::{parse_store_url, RedisConnection, RedisConnectionFactory};
pub use error::{StoreError, StoreResult};
pub use manager::{ConnectionHandle, ConnectionManager};

/// A message delivered on a subscribed channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelMessage {
    pub channel: String,
    pub payload: Vec<u8>,
}

/// Destination for channel messages received by a subscription.
pub type MessageSink = mpsc::Sender<ChannelMessage>;

/// A live link to the store.
#[async_trait]
pub trait StoreConnection: Send + Sync {
    /// List the client sessions currently known to the store.
    async fn client_list(&self) -> StoreResult<Vec<ClientSession>>;

    /// Register as a subscriber of `channel`, forwarding messages to `listener`.
    ///
    /// Subscribing again replaces the previous subscription of this connection.
    async fn subscribe(&self, channel: &str, listener: MessageSink) -> StoreResult<()>;
}

/// Creates fresh store connections.
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    async fn connect(&self) -> StoreResult<Box<dyn StoreConnection>>;
}
