//! Periodic failover check and subscription recovery.
//!
//! # Responsibilities
//! - Run the check on a fixed interval until shutdown
//! - Skip the tick entirely while the on/off switch is off
//! - On a confirmed failover: reset the connection, reconnect, resubscribe
//!
//! # States
//! ```text
//! Steady → Steady:                 switch off, healthy, or indeterminate
//! Steady → Recovering → Steady:    FailedOver; reset + connect + subscribe
//! ```
//!
//! # Design Decisions
//! - One tick in flight at a time (tick lock held for the whole tick)
//! - Every tick is bounded by `tick_timeout`; a hung tick releases the lock
//! - No progress is carried between ticks: a failed recovery is simply retried
//!   by the next tick, which will see zero subscribers again

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tokio::time::{self, MissedTickBehavior};

use crate::config::{FailoverConfig, FeatureFlag};
use crate::lifecycle::shutdown::ShutdownListener;
use crate::failover::detector::{Detection, FailoverDetector};
use crate::failover::introspector::ClientIntrospector;
use crate::failover::subscription::SubscriptionDescriptor;
use crate::observability::metrics;
use crate::store::{ConnectionHandle, ConnectionManager, MessageSink, StoreError, StoreResult};

/// Orchestrator state.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryState {
    Steady = 0,
    Recovering = 1,
}

impl From<u8> for RecoveryState {
    fn from(val: u8) -> Self {
        match val {
            1 => RecoveryState::Recovering,
            _ => RecoveryState::Steady,
        }
    }
}

/// What a successful tick did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The switch was off; nothing was evaluated.
    Disabled,
    /// The subscription is present.
    Healthy { subscribers: usize },
    /// Failover detected and the subscription restored on a fresh connection.
    Recovered { generation: u64 },
}

impl TickOutcome {
    fn label(&self) -> &'static str {
        match self {
            TickOutcome::Disabled => "disabled",
            TickOutcome::Healthy { .. } => "healthy",
            TickOutcome::Recovered { .. } => "recovered",
        }
    }
}

/// Why a tick ended without a verdict or without recovering.
#[derive(Debug, Error)]
pub enum TickError {
    /// The client list could not be read; no recovery attempted.
    #[error("cannot determine subscription state: {0}")]
    Indeterminate(#[source] StoreError),

    /// Failover was detected but reset/reconnect/resubscribe failed.
    #[error("recovery failed: {0}")]
    Recovery(#[source] StoreError),

    /// The tick did not finish in time and was abandoned.
    #[error("tick abandoned after {0:?}")]
    TimedOut(Duration),
}

impl TickError {
    fn label(&self) -> &'static str {
        match self {
            TickError::Indeterminate(_) => "indeterminate",
            TickError::Recovery(_) => "recovery_failed",
            TickError::TimedOut(_) => "timed_out",
        }
    }
}

/// Tick scheduling parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckSettings {
    pub interval: Duration,
    pub tick_timeout: Duration,
}

impl From<&FailoverConfig> for CheckSettings {
    fn from(config: &FailoverConfig) -> Self {
        Self {
            interval: config.check_interval(),
            tick_timeout: config.tick_timeout(),
        }
    }
}

/// Owns the check schedule and performs recovery.
pub struct RecoveryOrchestrator {
    detector: FailoverDetector,
    connections: Arc<ConnectionManager>,
    flag: Arc<dyn FeatureFlag>,
    subscription: SubscriptionDescriptor,
    listener: MessageSink,
    settings: CheckSettings,
    tick_lock: Mutex<()>,
    state: AtomicU8,
}

impl RecoveryOrchestrator {
    pub fn new(
        connections: Arc<ConnectionManager>,
        flag: Arc<dyn FeatureFlag>,
        subscription: SubscriptionDescriptor,
        listener: MessageSink,
        settings: CheckSettings,
    ) -> Self {
        let introspector = ClientIntrospector::new(subscription.host().clone());
        Self {
            detector: FailoverDetector::new(introspector, connections.clone()),
            connections,
            flag,
            subscription,
            listener,
            settings,
            tick_lock: Mutex::new(()),
            state: AtomicU8::new(RecoveryState::Steady as u8),
        }
    }

    pub fn state(&self) -> RecoveryState {
        RecoveryState::from(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, state: RecoveryState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    pub fn detector(&self) -> &FailoverDetector {
        &self.detector
    }

    pub fn subscription(&self) -> &SubscriptionDescriptor {
        &self.subscription
    }

    /// Establish the first subscription at startup.
    pub async fn subscribe_initial(&self) -> StoreResult<Arc<ConnectionHandle>> {
        let handle = self.recover().await?;
        tracing::info!(
            channel = %self.subscription.channel(),
            host = %self.subscription.host(),
            generation = handle.generation(),
            "Subscribed"
        );
        Ok(handle)
    }

    /// Discard the current connection, open a fresh one and resubscribe.
    ///
    /// Safe to call repeatedly: each call discards what the previous one installed.
    pub async fn recover(&self) -> StoreResult<Arc<ConnectionHandle>> {
        let result = self
            .connections
            .replace_subscribed(self.subscription.channel(), self.listener.clone())
            .await;

        metrics::record_recovery(result.is_ok());
        if let Ok(handle) = &result {
            metrics::record_connection_generation(handle.generation());
        }
        result
    }

    /// Run one check.
    pub async fn tick(&self) -> Result<TickOutcome, TickError> {
        let _guard = self.tick_lock.lock().await;

        if !self.flag.is_enabled() {
            return Ok(TickOutcome::Disabled);
        }

        let limit = self.settings.tick_timeout;
        let result = match time::timeout(limit, self.check_and_recover()).await {
            Ok(result) => result,
            Err(_) => Err(TickError::TimedOut(limit)),
        };
        self.set_state(RecoveryState::Steady);
        result
    }

    async fn check_and_recover(&self) -> Result<TickOutcome, TickError> {
        match self.detector.evaluate().await {
            Detection::Healthy { subscribers } => Ok(TickOutcome::Healthy { subscribers }),
            Detection::Indeterminate(e) => Err(TickError::Indeterminate(e)),
            Detection::FailedOver => {
                tracing::warn!(
                    channel = %self.subscription.channel(),
                    host = %self.subscription.host(),
                    "No subscribe session for this host, store failover assumed; resetting connection"
                );
                self.set_state(RecoveryState::Recovering);
                let handle = self.recover().await.map_err(TickError::Recovery)?;
                Ok(TickOutcome::Recovered {
                    generation: handle.generation(),
                })
            }
        }
    }

    /// Run the check loop until shutdown.
    pub async fn run(self, mut shutdown: ShutdownListener) {
        tracing::info!(
            interval_ms = self.settings.interval.as_millis() as u64,
            tick_timeout_ms = self.settings.tick_timeout.as_millis() as u64,
            channel = %self.subscription.channel(),
            host = %self.subscription.host(),
            "Failover check starting"
        );

        let mut ticker = time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let result = self.tick().await;
                    self.report(&result);
                }
                _ = shutdown.wait() => {
                    tracing::info!("Failover check received shutdown signal, exiting loop");
                    break;
                }
            }
        }
    }

    fn report(&self, result: &Result<TickOutcome, TickError>) {
        match result {
            Ok(TickOutcome::Disabled) => {
                tracing::trace!("Failover check switched off, tick skipped");
            }
            Ok(TickOutcome::Healthy { subscribers }) => {
                tracing::debug!(subscribers, "Subscription present");
                metrics::record_local_subscribers(*subscribers);
            }
            Ok(TickOutcome::Recovered { generation }) => {
                tracing::info!(
                    generation,
                    channel = %self.subscription.channel(),
                    "Subscription restored after failover"
                );
            }
            Err(e @ TickError::Indeterminate(_)) => {
                tracing::warn!(error = %e, "Subscription state unknown, retrying next tick");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failover recovery did not complete, retrying next tick");
            }
        }

        let label = match result {
            Ok(outcome) => outcome.label(),
            Err(e) => e.label(),
        };
        metrics::record_tick(label);
    }
}
