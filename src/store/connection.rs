//! Store connections on the `redis` client.
//!
//! # Responsibilities
//! - Open connections with a connect timeout and name them after this host
//!   (`CLIENT SETNAME <host>`)
//! - Run `CLIENT LIST` on the command connection
//! - Run `SUBSCRIBE` on a dedicated pub/sub connection and forward messages
//!
//! # Design Decisions
//! - The client name is the host identifier; the store reports sessions by it
//! - A command connection that faulted is dropped and re-opened on the next call
//! - The subscriber task dies with the connection, so the store drops that
//!   session when the handle is discarded

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use redis::aio::{ConnectionLike, MultiplexedConnection, PubSub};
use redis::{Client, ConnectionInfo, IntoConnectionInfo, Msg};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio::time;

use crate::config::StoreConfig;
use crate::store::client_list::parse_client_list;
use crate::store::error::{StoreError, StoreResult};
use crate::store::{ChannelMessage, ClientSession, ConnectionFactory, MessageSink, StoreConnection};

/// Parse a store URL (`redis://[user[:password]@]host[:port][/db]`).
pub fn parse_store_url(url: &str) -> StoreResult<ConnectionInfo> {
    url.into_connection_info()
        .map_err(|e| StoreError::InvalidAddress(format!("'{}': {}", url, e)))
}

struct ConnectSettings {
    client: Client,
    address: String,
    client_name: String,
    connect_timeout: Duration,
    command_timeout: Duration,
}

/// Creates [`RedisConnection`]s registered under this host's name.
#[derive(Clone)]
pub struct RedisConnectionFactory {
    settings: Arc<ConnectSettings>,
}

impl RedisConnectionFactory {
    /// Create a factory from store configuration.
    ///
    /// `client_name` is sent with `CLIENT SETNAME` on every connection.
    pub fn new(config: &StoreConfig, client_name: impl Into<String>) -> StoreResult<Self> {
        let info = parse_store_url(&config.url)?;
        let address = format!("{:?}", info.addr);
        let client = Client::open(info)?;

        Ok(Self {
            settings: Arc::new(ConnectSettings {
                client,
                address,
                client_name: client_name.into(),
                connect_timeout: Duration::from_millis(config.connect_timeout_ms),
                command_timeout: Duration::from_millis(config.command_timeout_ms),
            }),
        })
    }

    /// Store address, for logs.
    pub fn address(&self) -> &str {
        &self.settings.address
    }
}

#[async_trait]
impl ConnectionFactory for RedisConnectionFactory {
    async fn connect(&self) -> StoreResult<Box<dyn StoreConnection>> {
        let commands = open_commands(&self.settings).await?;
        tracing::debug!(
            address = %self.settings.address,
            client_name = %self.settings.client_name,
            "Store connection established"
        );

        Ok(Box::new(RedisConnection {
            settings: self.settings.clone(),
            commands: Mutex::new(Some(commands)),
            subscriber: Mutex::new(None),
        }))
    }
}

/// A store connection: one command connection plus an optional subscriber.
pub struct RedisConnection {
    settings: Arc<ConnectSettings>,
    commands: Mutex<Option<MultiplexedConnection>>,
    subscriber: Mutex<Option<JoinHandle<()>>>,
}

#[async_trait]
impl StoreConnection for RedisConnection {
    async fn client_list(&self) -> StoreResult<Vec<ClientSession>> {
        let mut slot = self.commands.lock().await;

        let mut conn = match slot.as_ref() {
            Some(conn) => conn.clone(),
            None => {
                tracing::debug!(address = %self.settings.address, "Re-opening command connection");
                let conn = open_commands(&self.settings).await?;
                *slot = Some(conn.clone());
                conn
            }
        };

        let reply = with_timeout(self.settings.command_timeout, async {
            let raw: String = redis::cmd("CLIENT").arg("LIST").query_async(&mut conn).await?;
            Ok::<_, StoreError>(raw)
        })
        .await;

        match reply {
            Ok(raw) => Ok(parse_client_list(&raw)),
            Err(e) => {
                if e.is_connection_fault() {
                    *slot = None;
                }
                Err(e)
            }
        }
    }

    async fn subscribe(&self, channel: &str, listener: MessageSink) -> StoreResult<()> {
        let pubsub = open_subscriber(&self.settings, channel).await?;

        let task = tokio::spawn(forward_messages(pubsub, listener));
        if let Some(previous) = self.subscriber.lock().await.replace(task) {
            previous.abort();
        }

        tracing::debug!(channel = %channel, "Subscribed");
        Ok(())
    }
}

impl Drop for RedisConnection {
    fn drop(&mut self) {
        if let Some(task) = self.subscriber.get_mut().take() {
            task.abort();
        }
    }
}

async fn open_commands(settings: &ConnectSettings) -> StoreResult<MultiplexedConnection> {
    let mut conn = with_timeout(settings.connect_timeout, async {
        Ok::<_, StoreError>(settings.client.get_multiplexed_async_connection().await?)
    })
    .await?;
    with_timeout(
        settings.command_timeout,
        set_client_name(&mut conn, &settings.client_name),
    )
    .await?;
    Ok(conn)
}

// Pub/sub needs a connection that can run CLIENT SETNAME before it turns
// into a subscriber, which only the single-socket async connection allows.
#[allow(deprecated)]
async fn open_subscriber(settings: &ConnectSettings, channel: &str) -> StoreResult<PubSub> {
    let mut conn = with_timeout(settings.connect_timeout, async {
        Ok::<_, StoreError>(settings.client.get_async_connection().await?)
    })
    .await?;
    with_timeout(
        settings.command_timeout,
        set_client_name(&mut conn, &settings.client_name),
    )
    .await?;

    let mut pubsub = conn.into_pubsub();
    with_timeout(settings.command_timeout, async {
        pubsub.subscribe(channel).await?;
        Ok::<(), StoreError>(())
    })
    .await?;
    Ok(pubsub)
}

async fn set_client_name<C>(conn: &mut C, name: &str) -> StoreResult<()>
where
    C: ConnectionLike + Send,
{
    let _: () = redis::cmd("CLIENT")
        .arg("SETNAME")
        .arg(name)
        .query_async(conn)
        .await?;
    Ok(())
}

fn channel_message(msg: &Msg) -> ChannelMessage {
    ChannelMessage {
        channel: msg.get_channel_name().to_string(),
        payload: msg.get_payload_bytes().to_vec(),
    }
}

async fn forward_messages(pubsub: PubSub, listener: MessageSink) {
    let mut messages = Box::pin(pubsub.into_on_message());
    while let Some(msg) = messages.next().await {
        if listener.send(channel_message(&msg)).await.is_err() {
            tracing::debug!("Message listener dropped, stopping subscriber");
            return;
        }
    }
    tracing::warn!("Subscriber connection lost");
}

async fn with_timeout<T, F>(limit: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(limit)),
    }
}
