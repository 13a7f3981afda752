//! Ownership of the single live store connection.
//!
//! # Responsibilities
//! - Hand out "the current connection", connecting lazily when none is installed
//! - Discard the installed connection on reset
//! - Replace it as a unit: reset, connect, subscribe, install
//!
//! # Design Decisions
//! - Readers load an `Arc<ConnectionHandle>` through `ArcSwapOption`, so they see
//!   either the old handle or the fully subscribed new one
//! - Lazy connects and replacements share one install lock; two handles are never
//!   installed side by side
//! - A handle that failed to subscribe is dropped, never installed

use std::ops::Deref;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tokio::sync::Mutex;

use crate::store::error::StoreResult;
use crate::store::{ConnectionFactory, MessageSink, StoreConnection};

/// A connection together with the generation it was created in.
pub struct ConnectionHandle {
    generation: u64,
    connection: Box<dyn StoreConnection>,
}

impl ConnectionHandle {
    /// Creation order of this handle, starting at 1.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl Deref for ConnectionHandle {
    type Target = dyn StoreConnection;

    fn deref(&self) -> &Self::Target {
        self.connection.as_ref()
    }
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("generation", &self.generation)
            .finish_non_exhaustive()
    }
}

/// Owns the process's store connection.
pub struct ConnectionManager {
    factory: Arc<dyn ConnectionFactory>,
    current: ArcSwapOption<ConnectionHandle>,
    install_lock: Mutex<()>,
    generation: AtomicU64,
    resets: AtomicU64,
}

impl ConnectionManager {
    pub fn new(factory: Arc<dyn ConnectionFactory>) -> Self {
        Self {
            factory,
            current: ArcSwapOption::empty(),
            install_lock: Mutex::new(()),
            generation: AtomicU64::new(0),
            resets: AtomicU64::new(0),
        }
    }

    /// The installed handle, if any, without connecting.
    pub fn current(&self) -> Option<Arc<ConnectionHandle>> {
        self.current.load_full()
    }

    /// The installed handle, connecting and installing one if none exists.
    pub async fn connection(&self) -> StoreResult<Arc<ConnectionHandle>> {
        if let Some(handle) = self.current() {
            return Ok(handle);
        }

        let _guard = self.install_lock.lock().await;
        // Another caller may have installed one while we waited.
        if let Some(handle) = self.current() {
            return Ok(handle);
        }

        let handle = Arc::new(self.open().await?);
        self.current.store(Some(handle.clone()));
        Ok(handle)
    }

    /// Discard the installed handle. The next `connection()` opens a fresh one.
    ///
    /// Returns true if a handle was installed.
    pub fn reset(&self) -> bool {
        self.resets.fetch_add(1, Ordering::Relaxed);
        match self.current.swap(None) {
            Some(old) => {
                tracing::debug!(generation = old.generation(), "Store connection discarded");
                true
            }
            None => false,
        }
    }

    /// Reset, open a fresh connection, subscribe it to `channel` and install it.
    ///
    /// On failure nothing is installed; the previous handle is already gone.
    pub async fn replace_subscribed(
        &self,
        channel: &str,
        listener: MessageSink,
    ) -> StoreResult<Arc<ConnectionHandle>> {
        let _guard = self.install_lock.lock().await;
        self.reset();

        let handle = Arc::new(self.open().await?);
        handle.subscribe(channel, listener).await?;

        self.current.store(Some(handle.clone()));
        tracing::debug!(
            generation = handle.generation(),
            channel = %channel,
            "Subscribed store connection installed"
        );
        Ok(handle)
    }

    /// Generation of the most recently opened connection (0 before the first).
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Number of resets performed so far.
    pub fn resets(&self) -> u64 {
        self.resets.load(Ordering::Relaxed)
    }

    async fn open(&self) -> StoreResult<ConnectionHandle> {
        let connection = self.factory.connect().await?;
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        Ok(ConnectionHandle {
            generation,
            connection,
        })
    }
}
