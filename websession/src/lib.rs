#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Session configuration: cache age, retry count, additional headers.
///
/// Defaults live on each session instance ([`SessionConfig::default`]),
/// never in process-wide globals.
pub mod config;

/// Scoped temporary files for downloaded payloads.
///
/// A [`DownloadedFile`] deletes itself on drop unless
/// [`persist`](DownloadedFile::persist)ed: the explicit form of a
/// delete-after-completion temp file.
pub mod download;

/// Error types for session operations.
///
/// Defines [`Error`] which separates:
/// - Transport failures (retried, surfaced only after exhaustion)
/// - HTTP status errors (final on first observation, body preserved)
/// - Fail-fast input errors (URL, headers) and per-caller decode errors
pub mod error;

/// Bounded retry over a transport.
///
/// [`RetryingTransport`](retry::RetryingTransport) retries transport
/// failures back to back up to a ceiling and never retries a received HTTP
/// status.
pub mod retry;

/// The public session and its request surface.
pub mod session;

/// The network transport boundary.
///
/// [`Transport`](transport::Transport) performs one HTTP exchange per call;
/// [`ReqwestTransport`](transport::ReqwestTransport) is the production
/// implementation.
pub mod transport;

mod inflight;

pub use config::SessionConfig;
pub use download::DownloadedFile;
pub use error::Error;
pub use session::{Fetched, ImageData, SessionRequest, WebSession, WebSessionBuilder};
pub use transport::{ReqwestTransport, Transport, TransportError, TransportRequest, TransportResponse};

pub use websession_core::{
    CacheEntry, CacheState, CacheStatus, CacheStore, DeleteStatus, KeyPart, Payload, RequestKey,
    StoreError, StoreResult,
};
