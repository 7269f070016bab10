//! The one way components reach the store.
//!
//! A handle is built explicitly at startup, cloned into every component, and
//! shut down explicitly. Each persistence step is a single `async` call that
//! resolves to the value or the error.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rafiq_core::EngagementError;
use tokio::sync::{Mutex, MutexGuard};

use crate::error::{Result, StoreError};
use crate::store::Store;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<Mutex<Store>>,
    timeout: Duration,
}

impl StoreHandle {
    pub fn new(store: Store, timeout: Duration) -> Self {
        Self {
            store: Arc::new(Mutex::new(store)),
            timeout,
        }
    }

    pub fn open(path: &Path, timeout: Duration) -> Result<Self> {
        let store = Store::open(path)?;
        tracing::info!("opened engagement store at {}", path.display());
        Ok(Self::new(store, timeout))
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Store::open_in_memory()?, DEFAULT_REQUEST_TIMEOUT))
    }

    /// Run one store operation. Waiting for the connection is bounded by the
    /// request timeout; SQLite's busy_timeout bounds the operation itself.
    pub async fn call<T>(
        &self,
        op: impl FnOnce(&Store) -> Result<T>,
    ) -> std::result::Result<T, EngagementError> {
        let store = self.acquire().await?;
        op(&store).map_err(EngagementError::from)
    }

    /// Checkpoint the WAL so the database file is complete on disk.
    pub async fn shutdown(&self) -> Result<()> {
        let store = self.acquire().await?;
        store.checkpoint_truncate()?;
        tracing::info!("store checkpointed for shutdown");
        Ok(())
    }

    async fn acquire(&self) -> Result<MutexGuard<'_, Store>> {
        tokio::time::timeout(self.timeout, self.store.lock())
            .await
            .map_err(|_| StoreError::Timeout(self.timeout))
    }
}
