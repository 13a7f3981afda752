//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve the host identity once
//! - Build the store connection factory and manager
//! - Assemble the recovery orchestrator
//! - Provide the sink channel messages are delivered to
//!
//! # Design Decisions
//! - Fail fast: an unresolvable host or unusable store address is fatal
//! - An unreachable store is not: the check loop keeps retrying

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::{EnvFlag, GuardConfig};
use crate::failover::{
    CheckSettings, HostId, HostResolutionError, RecoveryOrchestrator, SubscriptionDescriptor,
};
use crate::store::{
    ChannelMessage, ConnectionManager, MessageSink, RedisConnectionFactory, StoreError,
};

/// Fatal startup errors.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("cannot resolve host identity: {0}")]
    Host(#[from] HostResolutionError),

    #[error("cannot prepare store connection: {0}")]
    Store(#[from] StoreError),
}

/// Build the orchestrator described by `config`, delivering channel
/// messages to `listener`.
pub fn build_orchestrator(
    config: &GuardConfig,
    listener: MessageSink,
) -> Result<RecoveryOrchestrator, StartupError> {
    let host = HostId::resolve_or(config.failover.host_id.as_deref())?;
    let factory = RedisConnectionFactory::new(&config.store, host.as_str())?;

    tracing::info!(
        host = %host,
        store = %factory.address(),
        channel = %config.failover.channel,
        switch = %config.failover.enabled_env,
        "Failover guard configured"
    );

    let connections = Arc::new(ConnectionManager::new(Arc::new(factory)));
    let flag = Arc::new(EnvFlag::new(&config.failover.enabled_env));
    let subscription = SubscriptionDescriptor::new(&config.failover.channel, host);

    Ok(RecoveryOrchestrator::new(
        connections,
        flag,
        subscription,
        listener,
        CheckSettings::from(&config.failover),
    ))
}

/// Create the message sink and a task that logs every delivered message.
///
/// Payload handling belongs to the embedding application; the task ends when
/// every sender is gone.
pub fn spawn_message_log(buffer: usize) -> (MessageSink, JoinHandle<usize>) {
    let (tx, mut rx) = mpsc::channel::<ChannelMessage>(buffer);
    let task = tokio::spawn(async move {
        let mut received = 0;
        while let Some(message) = rx.recv().await {
            received += 1;
            tracing::debug!(
                channel = %message.channel,
                bytes = message.payload.len(),
                "Channel message received"
            );
        }
        received
    });
    (tx, task)
}
