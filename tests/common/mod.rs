//! Shared utilities for integration tests.
#![allow(dead_code)]

pub mod mock_store;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use redis::{ErrorKind, RedisError};
use tokio::sync::mpsc;

use failover_guard::failover::{CheckSettings, HostId, RecoveryOrchestrator, SubscriptionDescriptor};
use failover_guard::store::{
    ChannelMessage, ClientSession, ConnectionFactory, ConnectionManager, MessageSink,
    StoreConnection, StoreError, StoreResult,
};

pub const CHANNEL: &str = "channelX";
pub const LOCAL_HOST: &str = "A";

/// In-memory stand-in for the store.
///
/// The client list is the scripted `sessions` plus one `subscribe` session per
/// subscription the store currently holds for `auto_register_host`.
#[derive(Default)]
pub struct FakeStore {
    state: Mutex<FakeState>,
}

#[derive(Default)]
struct FakeState {
    sessions: Vec<ClientSession>,
    auto_register_host: Option<String>,
    registered: usize,
    fail_connects: bool,
    fail_queries: bool,
    fail_subscribes: bool,
    hang_queries: bool,
    connects: usize,
    client_list_calls: usize,
    subscribe_calls: Vec<String>,
    live_subscriptions: usize,
}

impl FakeStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn set_sessions(&self, sessions: Vec<ClientSession>) {
        self.state().sessions = sessions;
    }

    /// Make successful subscriptions show up in the client list under `host`.
    pub fn auto_register(&self, host: &str) {
        self.state().auto_register_host = Some(host.to_string());
    }

    /// The standby takes over: every subscription the store held is forgotten.
    pub fn failover(&self) {
        let mut state = self.state();
        state.registered = 0;
        state.sessions.clear();
    }

    pub fn fail_connects(&self, fail: bool) {
        self.state().fail_connects = fail;
    }

    pub fn fail_queries(&self, fail: bool) {
        self.state().fail_queries = fail;
    }

    pub fn fail_subscribes(&self, fail: bool) {
        self.state().fail_subscribes = fail;
    }

    pub fn hang_queries(&self, hang: bool) {
        self.state().hang_queries = hang;
    }

    pub fn connects(&self) -> usize {
        self.state().connects
    }

    pub fn client_list_calls(&self) -> usize {
        self.state().client_list_calls
    }

    pub fn subscribe_calls(&self) -> Vec<String> {
        self.state().subscribe_calls.clone()
    }

    /// Subscriptions held by connections that have not been dropped.
    pub fn live_subscriptions(&self) -> usize {
        self.state().live_subscriptions
    }

    /// Subscriptions the store currently reports.
    pub fn registered(&self) -> usize {
        self.state().registered
    }
}

pub struct FakeFactory {
    store: Arc<FakeStore>,
}

impl FakeFactory {
    pub fn new(store: Arc<FakeStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ConnectionFactory for FakeFactory {
    async fn connect(&self) -> StoreResult<Box<dyn StoreConnection>> {
        let mut state = self.store.state();
        state.connects += 1;
        if state.fail_connects {
            return Err(StoreError::Client(RedisError::from(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "connection refused",
            ))));
        }
        Ok(Box::new(FakeConnection {
            store: self.store.clone(),
            subscribed: AtomicBool::new(false),
        }))
    }
}

pub struct FakeConnection {
    store: Arc<FakeStore>,
    subscribed: AtomicBool,
}

#[async_trait]
impl StoreConnection for FakeConnection {
    async fn client_list(&self) -> StoreResult<Vec<ClientSession>> {
        let hang = {
            let mut state = self.store.state();
            state.client_list_calls += 1;
            if state.fail_queries {
                return Err(StoreError::Client(RedisError::from((
                    ErrorKind::IoError,
                    "connection dropped",
                ))));
            }
            state.hang_queries
        };
        if hang {
            std::future::pending::<()>().await;
        }

        let state = self.store.state();
        let mut sessions = state.sessions.clone();
        if let Some(host) = &state.auto_register_host {
            for _ in 0..state.registered {
                sessions.push(ClientSession::new(host.clone(), "subscribe"));
            }
        }
        Ok(sessions)
    }

    async fn subscribe(&self, channel: &str, listener: MessageSink) -> StoreResult<()> {
        {
            let mut state = self.store.state();
            state.subscribe_calls.push(channel.to_string());
            if state.fail_subscribes {
                return Err(StoreError::Client(RedisError::from((
                    ErrorKind::ResponseError,
                    "subscribe rejected",
                ))));
            }
            if !self.subscribed.swap(true, Ordering::SeqCst) {
                state.live_subscriptions += 1;
                state.registered += 1;
            }
        }
        let _ = listener.try_send(ChannelMessage {
            channel: channel.to_string(),
            payload: b"subscribed".to_vec(),
        });
        Ok(())
    }
}

impl Drop for FakeConnection {
    fn drop(&mut self) {
        if self.subscribed.load(Ordering::SeqCst) {
            let mut state = self.store.state();
            state.live_subscriptions -= 1;
            state.registered = state.registered.saturating_sub(1);
        }
    }
}

/// An orchestrator wired to a fake store.
pub struct Harness {
    pub store: Arc<FakeStore>,
    pub connections: Arc<ConnectionManager>,
    pub flag: Arc<AtomicBool>,
    pub orchestrator: RecoveryOrchestrator,
    pub messages: mpsc::Receiver<ChannelMessage>,
}

pub fn harness(enabled: bool) -> Harness {
    harness_with(enabled, Duration::from_secs(3), Duration::from_secs(1))
}

pub fn harness_with(enabled: bool, interval: Duration, tick_timeout: Duration) -> Harness {
    let store = FakeStore::new();
    let connections = Arc::new(ConnectionManager::new(Arc::new(FakeFactory::new(
        store.clone(),
    ))));
    let flag = Arc::new(AtomicBool::new(enabled));
    let (tx, messages) = mpsc::channel(64);
    let orchestrator = RecoveryOrchestrator::new(
        connections.clone(),
        flag.clone(),
        SubscriptionDescriptor::new(CHANNEL, HostId::new(LOCAL_HOST).unwrap()),
        tx,
        CheckSettings {
            interval,
            tick_timeout,
        },
    );

    Harness {
        store,
        connections,
        flag,
        orchestrator,
        messages,
    }
}
