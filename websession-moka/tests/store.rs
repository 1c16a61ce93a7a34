//! Tests for the Moka-backed cache store.

use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use http::Method;
use url::Url;
use websession_core::{CacheEntry, CacheState, CacheStore, DeleteStatus, RequestKey};
use websession_moka::MokaStore;

fn make_key(id: u32) -> RequestKey {
    let url = Url::parse("https://example.com/items").unwrap();
    let id = id.to_string();
    RequestKey::derive(&Method::GET, &url, &[("id", id.as_str())], None)
}

fn make_entry(ttl: Duration) -> CacheEntry {
    CacheEntry::new(
        Bytes::from_static(b"payload"),
        Url::parse("https://example.com/items?id=1").unwrap(),
        ttl,
    )
}

#[tokio::test]
async fn write_read_remove_round_trip() {
    let store = MokaStore::builder().build();
    let key = make_key(1);
    let entry = make_entry(Duration::from_secs(60));

    assert!(store.read(&key).await.unwrap().is_none());

    store
        .write(&key, entry.clone(), Duration::from_secs(60))
        .await
        .unwrap();

    let read = store.read(&key).await.unwrap().unwrap();
    assert_eq!(read.payload(), entry.payload());
    assert_eq!(read.response_url(), entry.response_url());

    assert_eq!(store.remove(&key).await.unwrap(), DeleteStatus::Deleted);
    assert_eq!(store.remove(&key).await.unwrap(), DeleteStatus::Missing);
    assert!(store.read(&key).await.unwrap().is_none());
}

#[tokio::test]
async fn reader_classifies_expired_entries() {
    let store = MokaStore::builder().build();
    let key = make_key(2);

    // Stored an hour ago with a 10 second ttl: the store may or may not
    // still hold it, but any read must classify it as expired.
    let stale = CacheEntry::new_at(
        Bytes::from_static(b"old"),
        Url::parse("https://example.com/items?id=2").unwrap(),
        Duration::from_secs(10),
        Utc::now() - chrono::Duration::hours(1),
    );
    store
        .write(&key, stale, Duration::from_secs(10))
        .await
        .unwrap();

    if let Some(entry) = store.read(&key).await.unwrap() {
        assert_eq!(entry.state(), CacheState::Expired);
    }
}

#[tokio::test]
async fn capacity_bound_evicts() {
    let store = MokaStore::builder().max_capacity(3).build();

    for i in 0..10 {
        store
            .write(&make_key(i), make_entry(Duration::from_secs(300)), Duration::from_secs(300))
            .await
            .unwrap();
    }
    store.run_pending_tasks().await;

    assert!(store.entry_count() <= 3);
}

#[tokio::test]
async fn distinct_keys_do_not_collide() {
    let store = MokaStore::builder().build();
    let first = make_key(1);
    let second = make_key(2);

    store
        .write(&first, make_entry(Duration::from_secs(60)), Duration::from_secs(60))
        .await
        .unwrap();

    assert!(store.read(&first).await.unwrap().is_some());
    assert!(store.read(&second).await.unwrap().is_none());
}
