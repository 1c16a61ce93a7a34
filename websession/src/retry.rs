//! Bounded retry over a transport.

use std::num::NonZeroU32;

use crate::error::Error;
use crate::transport::{Transport, TransportRequest, TransportResponse};

/// Wraps a [`Transport`] with bounded retry-on-transport-error semantics.
///
/// Only transport failures are retried. A fully received response is final
/// on first observation regardless of its status code: a success status
/// passes through, an error status becomes [`Error::Http`] immediately.
/// Retries happen back to back; attempts never exceed the configured
/// ceiling.
#[derive(Debug)]
pub struct RetryingTransport<T> {
    transport: T,
    max_attempts: NonZeroU32,
}

impl<T: Transport> RetryingTransport<T> {
    /// Wraps `transport`, allowing at most `max_attempts` tries per call.
    pub fn new(transport: T, max_attempts: NonZeroU32) -> Self {
        RetryingTransport {
            transport,
            max_attempts,
        }
    }

    /// The configured attempt ceiling.
    pub fn max_attempts(&self) -> NonZeroU32 {
        self.max_attempts
    }

    /// Performs the exchange, retrying transport errors up to the ceiling.
    pub async fn execute(&self, request: &TransportRequest) -> Result<TransportResponse, Error> {
        let max = self.max_attempts.get();
        let mut attempt = 1u32;
        loop {
            match self.transport.send(request).await {
                Ok(response) if response.status.is_success() => return Ok(response),
                Ok(response) => {
                    // The server answered; an error status is a complete
                    // answer and is never retried.
                    return Err(Error::Http {
                        status: response.status,
                        body: response.body,
                        response_url: response.response_url,
                    });
                }
                Err(source) if attempt < max => {
                    tracing::warn!(
                        url = %request.url,
                        attempt,
                        max_attempts = max,
                        error = %source,
                        "transport error, retrying"
                    );
                    attempt += 1;
                }
                Err(source) => {
                    return Err(Error::Transport {
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }
}
