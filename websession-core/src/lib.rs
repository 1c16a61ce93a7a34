#![warn(missing_docs)]
//! # websession-core
//!
//! Core types shared by the `websession` HTTP client and its cache store
//! implementations.
//!
//! This crate defines the vocabulary the session and the stores agree on:
//!
//! - **Identify** a logical request ([`RequestKey`])
//! - **Represent** a stored response ([`CacheEntry`])
//! - **Store** entries behind an async key-value boundary ([`CacheStore`])
//!
//! The session crate consumes these types; store crates (like
//! `websession-moka`) implement [`CacheStore`]. Nothing in this crate
//! performs network or disk I/O.

pub mod key;
pub mod store;
pub mod value;

pub use key::{KeyPart, RequestKey};
pub use store::{CacheStore, DeleteStatus, StoreError, StoreResult};
pub use value::{CacheEntry, CacheState, CacheStatus};

/// Raw byte payload type for stored response bodies.
/// `Bytes` clones are reference-counted, so fanning a payload out to many
/// waiters never copies the body.
pub type Payload = bytes::Bytes;
