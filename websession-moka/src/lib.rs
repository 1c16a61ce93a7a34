#![warn(missing_docs)]
//! # websession-moka
//!
//! In-memory [`CacheStore`](websession_core::CacheStore) implementation for
//! the `websession` HTTP client, backed by [`moka`]'s concurrent async
//! cache.
//!
//! ```
//! use websession_moka::MokaStore;
//!
//! let store = MokaStore::builder().max_capacity(10_000).build();
//! ```

mod backend;
mod builder;

pub use backend::MokaStore;
pub use builder::MokaStoreBuilder;
