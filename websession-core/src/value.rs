//! Cached response entries with expiration metadata.
//!
//! A [`CacheEntry`] wraps a stored response payload with the timestamps
//! needed for read-time expiry: expiration is a predicate evaluated on every
//! read, never an active sweep. Stores may additionally evict entries on
//! their own schedule (see [`CacheEntry::ttl`]), but the predicate is
//! authoritative.

use chrono::{DateTime, Utc};
use std::time::Duration;
use url::Url;

use crate::Payload;

/// Whether a delivered result came from the cache or from the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheStatus {
    /// Served from a fresh cache entry; no network access occurred.
    Hit,
    /// Fetched from the network (cache disabled, bypassed, absent, or
    /// expired).
    Miss,
}

/// Freshness of a [`CacheEntry`] at some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// The entry is within its TTL and may be served.
    Fresh,
    /// The entry has outlived its TTL and must be treated as absent.
    Expired,
}

/// A stored response: payload, final response URL, and expiry metadata.
///
/// Entries are created whole on a successful cacheable response and read
/// whole; readers never observe a partially written entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    payload: Payload,
    response_url: Url,
    stored_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl CacheEntry {
    /// Creates an entry stored now, expiring after `ttl`.
    pub fn new(payload: Payload, response_url: Url, ttl: Duration) -> Self {
        Self::new_at(payload, response_url, ttl, Utc::now())
    }

    /// Creates an entry with an explicit storage instant.
    ///
    /// `new` with the current time is the production path; this exists so
    /// that expiry boundaries can be tested without sleeping.
    pub fn new_at(payload: Payload, response_url: Url, ttl: Duration, now: DateTime<Utc>) -> Self {
        let ttl = chrono::Duration::from_std(ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = now
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        CacheEntry {
            payload,
            response_url,
            stored_at: now,
            expires_at,
        }
    }

    /// Returns the stored payload.
    #[inline]
    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the response URL the payload was fetched from.
    #[inline]
    pub fn response_url(&self) -> &Url {
        &self.response_url
    }

    /// Returns when the entry was stored.
    #[inline]
    pub fn stored_at(&self) -> DateTime<Utc> {
        self.stored_at
    }

    /// Returns when the entry expires.
    #[inline]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Consumes the entry, returning the payload and response URL.
    pub fn into_parts(self) -> (Payload, Url) {
        (self.payload, self.response_url)
    }

    /// Classifies the entry against the current clock.
    pub fn state(&self) -> CacheState {
        self.state_at(Utc::now())
    }

    /// Classifies the entry at an explicit instant.
    ///
    /// An entry is `Expired` once `now` is strictly past `expires_at`; a
    /// read at exactly the expiry instant still counts as fresh.
    pub fn state_at(&self, now: DateTime<Utc>) -> CacheState {
        if now > self.expires_at {
            CacheState::Expired
        } else {
            CacheState::Fresh
        }
    }

    /// Remaining time until expiry, or `None` once expired.
    ///
    /// Stores can use this as an eviction hint when inserting.
    pub fn ttl(&self) -> Option<Duration> {
        let remaining = self.expires_at.signed_duration_since(Utc::now());
        remaining.to_std().ok().filter(|d| !d.is_zero())
    }
}
