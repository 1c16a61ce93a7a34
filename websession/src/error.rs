//! Error types for session operations.

use std::sync::Arc;

use bytes::Bytes;
use http::StatusCode;
use thiserror::Error;
use url::Url;

use crate::transport::TransportError;

/// Error type for session operations.
///
/// `Transport` and `Http` are the two mutually exclusive terminal outcomes
/// of a network exchange: either the exchange itself failed after the retry
/// budget, or the server answered with a non-success status. Cache store
/// failures never appear here; they degrade to cache misses inside the
/// session.
///
/// The type is `Clone` because one outcome fans out to every caller
/// attached to the same in-flight request; shared sources are held in
/// [`Arc`].
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// The network exchange failed and the retry budget is exhausted.
    #[error("transport failure after {attempts} attempt(s)")]
    Transport {
        /// How many attempts were made before giving up.
        attempts: u32,
        /// The error from the final attempt.
        #[source]
        source: TransportError,
    },

    /// The server answered with a non-success status code.
    ///
    /// A fully received response is a complete answer and is never retried;
    /// the body is kept for caller inspection.
    #[error("server returned HTTP {status}")]
    Http {
        /// The received status code.
        status: StatusCode,
        /// The received response body.
        body: Bytes,
        /// The final response URL.
        response_url: Url,
    },

    /// The request URL failed to parse.
    ///
    /// Reported before any cache or network interaction.
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    /// A configured or per-request header has an invalid name or value.
    #[error("invalid header")]
    Header(#[source] Arc<http::Error>),

    /// The response payload is not valid JSON.
    #[error("response body is not valid JSON")]
    Json(#[source] Arc<serde_json::Error>),

    /// A downloaded payload could not be written to a temporary file.
    #[error("failed to materialize downloaded file")]
    Download(#[source] Arc<std::io::Error>),

    /// The request owning the network call was dropped before completing.
    #[error("request was abandoned before completion")]
    Abandoned,
}

impl Error {
    /// True for a transport-level failure (retried and exhausted).
    pub fn is_transport(&self) -> bool {
        matches!(self, Error::Transport { .. })
    }

    /// True for an HTTP status error (received and final).
    pub fn is_http(&self) -> bool {
        matches!(self, Error::Http { .. })
    }

    /// The HTTP status code, when this is an HTTP status error.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
