//! The network transport boundary.
//!
//! A [`Transport`] performs one HTTP exchange per [`send`](Transport::send)
//! call. A response carrying *any* status code is `Ok`; classifying error
//! statuses is the retry layer's job. `Err` means the exchange itself could
//! not be completed: connection refused, DNS failure, timeout, reset, or a
//! body cut short after the status line. Per-attempt timeouts belong to the
//! transport (configure them on the underlying client).

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use http::{HeaderMap, Method, StatusCode};
use thiserror::Error;
use url::Url;

/// A single outgoing HTTP exchange.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    /// Request method.
    pub method: Method,
    /// Fully built request URL, query string included.
    pub url: Url,
    /// Merged request headers.
    pub headers: HeaderMap,
    /// Request body, if any.
    pub body: Option<Bytes>,
}

/// A fully received HTTP response.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    /// Received status code.
    pub status: StatusCode,
    /// Received response headers.
    pub headers: HeaderMap,
    /// Received response body.
    pub body: Bytes,
    /// Final response URL (after any redirects the transport followed).
    pub response_url: Url,
}

/// Failure to establish or complete a network exchange.
///
/// Cloneable so that one failure can fan out to every caller attached to
/// the same in-flight request.
#[derive(Debug, Clone, Error)]
#[error(transparent)]
pub struct TransportError(Arc<dyn std::error::Error + Send + Sync>);

impl TransportError {
    /// Wraps an underlying transport failure.
    pub fn new(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        TransportError(Arc::new(source))
    }
}

/// An asynchronous HTTP transport.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Performs one exchange; completes exactly once.
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        (**self).send(request).await
    }
}

/// Production transport backed by [`reqwest::Client`].
///
/// Connection pooling, TLS, redirects, and per-attempt timeouts are the
/// client's concern; configure them on the `reqwest::Client` passed to
/// [`with_client`](ReqwestTransport::with_client).
#[derive(Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport over a default client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport over a preconfigured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        ReqwestTransport { client }
    }
}

impl fmt::Debug for ReqwestTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestTransport").finish_non_exhaustive()
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await.map_err(TransportError::new)?;
        let status = response.status();
        let response_url = response.url().clone();
        let headers = response.headers().clone();
        // A failure here means the exchange was cut short mid-body; no
        // complete response was received, so it counts as a transport
        // error, not an HTTP one.
        let body = response.bytes().await.map_err(TransportError::new)?;

        Ok(TransportResponse {
            status,
            headers,
            body,
            response_url,
        })
    }
}
