//! The cache store boundary.
//!
//! The session consumes this trait; it never implements storage itself.
//! Stores are plain key-value collaborators: they hold whole [`CacheEntry`]
//! values and may evict on their own schedule, but freshness classification
//! belongs to the reader.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

use crate::{CacheEntry, RequestKey};

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error type for cache store operations.
///
/// Store failures are non-fatal to the session: a failed read degrades to a
/// cache miss and a failed write never withholds a network result from the
/// caller.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Internal store error, state or computation error.
    ///
    /// Any error not related to network interaction.
    #[error(transparent)]
    Internal(Box<dyn std::error::Error + Send + Sync>),

    /// Network interaction error.
    ///
    /// Errors occurring during communication with remote stores.
    #[error(transparent)]
    Connection(Box<dyn std::error::Error + Send + Sync>),
}

/// Outcome of a [`CacheStore::remove`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStatus {
    /// The entry existed and was removed.
    Deleted,
    /// No entry existed for the key.
    Missing,
}

/// An async key-value store for cached responses.
///
/// `ttl` on [`write`](CacheStore::write) is an eviction hint: stores should
/// drop the entry after that duration, but readers must still classify
/// returned entries with [`CacheEntry::state`]. Expiry is a read-time
/// predicate, and a store returning a stale entry is not an error.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Reads the entry for a key, expired or not.
    async fn read(&self, key: &RequestKey) -> StoreResult<Option<CacheEntry>>;

    /// Writes an entry whole. Overwrites any previous entry for the key.
    async fn write(&self, key: &RequestKey, entry: CacheEntry, ttl: Duration) -> StoreResult<()>;

    /// Removes the entry for a key.
    async fn remove(&self, key: &RequestKey) -> StoreResult<DeleteStatus>;

    /// Returns the name of this store for log messages.
    fn name(&self) -> &str {
        "store"
    }
}

#[async_trait]
impl CacheStore for Box<dyn CacheStore> {
    async fn read(&self, key: &RequestKey) -> StoreResult<Option<CacheEntry>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &RequestKey, entry: CacheEntry, ttl: Duration) -> StoreResult<()> {
        (**self).write(key, entry, ttl).await
    }

    async fn remove(&self, key: &RequestKey) -> StoreResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

#[async_trait]
impl CacheStore for Arc<dyn CacheStore> {
    async fn read(&self, key: &RequestKey) -> StoreResult<Option<CacheEntry>> {
        (**self).read(key).await
    }

    async fn write(&self, key: &RequestKey, entry: CacheEntry, ttl: Duration) -> StoreResult<()> {
        (**self).write(key, entry, ttl).await
    }

    async fn remove(&self, key: &RequestKey) -> StoreResult<DeleteStatus> {
        (**self).remove(key).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
