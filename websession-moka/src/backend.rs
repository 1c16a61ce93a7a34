//! Moka store implementation.

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use websession_core::{CacheEntry, CacheStore, DeleteStatus, RequestKey, StoreResult};

/// In-memory cache store powered by Moka.
///
/// `MokaStore` provides a concurrent in-memory store with automatic entry
/// expiration: each entry is scheduled for eviction when its own
/// [`CacheEntry::ttl`] runs out. Eviction is best-effort: an expired entry
/// may briefly remain readable until Moka's background maintenance runs,
/// which is fine because the session classifies freshness on every read.
///
/// Data is not persisted and not shared across processes.
///
/// # Examples
///
/// ```
/// use websession_moka::MokaStore;
///
/// let store = MokaStore::builder().max_capacity(10_000).build();
/// ```
#[derive(Clone, Debug)]
pub struct MokaStore {
    pub(crate) cache: Cache<RequestKey, CacheEntry>,
}

impl MokaStore {
    /// Creates a new builder.
    pub fn builder() -> crate::builder::MokaStoreBuilder {
        crate::builder::MokaStoreBuilder::new()
    }

    /// Returns the number of entries currently held.
    ///
    /// Approximate under concurrent use, exact after
    /// [`run_pending_tasks`](Self::run_pending_tasks).
    pub fn entry_count(&self) -> u64 {
        self.cache.entry_count()
    }

    /// Runs Moka's pending maintenance tasks (eviction, bookkeeping).
    ///
    /// Only needed by tests that assert on eviction timing.
    pub async fn run_pending_tasks(&self) {
        self.cache.run_pending_tasks().await;
    }
}

#[async_trait]
impl CacheStore for MokaStore {
    async fn read(&self, key: &RequestKey) -> StoreResult<Option<CacheEntry>> {
        Ok(self.cache.get(key).await)
    }

    async fn write(&self, key: &RequestKey, entry: CacheEntry, _ttl: Duration) -> StoreResult<()> {
        // The per-entry Expiry hook reads the deadline out of the entry
        // itself, so the ttl argument carries no extra information here.
        self.cache.insert(key.clone(), entry).await;
        Ok(())
    }

    async fn remove(&self, key: &RequestKey) -> StoreResult<DeleteStatus> {
        match self.cache.remove(key).await {
            Some(_) => Ok(DeleteStatus::Deleted),
            None => Ok(DeleteStatus::Missing),
        }
    }

    fn name(&self) -> &str {
        "moka"
    }
}
