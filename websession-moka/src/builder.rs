//! Builder for [`MokaStore`].

use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use websession_core::{CacheEntry, RequestKey};

use crate::MokaStore;

/// Schedules each entry's eviction from its own expiry timestamp.
struct EntryTtl;

impl Expiry<RequestKey, CacheEntry> for EntryTtl {
    fn expire_after_create(
        &self,
        _key: &RequestKey,
        value: &CacheEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        // An already-expired entry gets evicted immediately.
        Some(value.ttl().unwrap_or(Duration::ZERO))
    }
}

/// Builder for [`MokaStore`].
///
/// ```
/// use websession_moka::MokaStore;
///
/// let store = MokaStore::builder().max_capacity(500).build();
/// ```
#[derive(Debug, Default)]
pub struct MokaStoreBuilder {
    max_capacity: Option<u64>,
}

impl MokaStoreBuilder {
    /// Creates a builder with unbounded capacity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds the store to at most `max_capacity` entries.
    ///
    /// When the bound is reached, least recently used entries are evicted.
    pub fn max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = Some(max_capacity);
        self
    }

    /// Builds the store.
    pub fn build(self) -> MokaStore {
        let mut builder = Cache::builder().expire_after(EntryTtl);
        if let Some(capacity) = self.max_capacity {
            builder = builder.max_capacity(capacity);
        }
        MokaStore {
            cache: builder.build(),
        }
    }
}
