//! The public session: cache, then in-flight registry, then retrying
//! transport.
//!
//! Every operation funnels through one pipeline. The cache is consulted
//! first (GET-style reads only), the in-flight registry second (concurrent
//! callers for the same logical request share one network call), and the
//! retrying transport last. Results fan out to every attached caller.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use http::header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use http::Method;
use tracing::{debug, warn};
use url::Url;
use websession_core::{CacheEntry, CacheState, CacheStatus, CacheStore, RequestKey};

use crate::config::SessionConfig;
use crate::download::DownloadedFile;
use crate::error::Error;
use crate::inflight::{Flight, InFlightRegistry};
use crate::retry::RetryingTransport;
use crate::transport::{ReqwestTransport, Transport, TransportRequest};

/// A delivered result: the payload, where it finally came from, and whether
/// the cache served it.
#[derive(Debug, Clone)]
pub struct Fetched<T> {
    /// The payload.
    pub data: T,
    /// The final response URL.
    pub response_url: Url,
    /// Whether the cache or the network produced this result.
    pub cache_status: CacheStatus,
}

/// An undecoded image payload.
///
/// Decoding is the caller's concern; the session only fetches the bytes and
/// reports the advertised content type.
#[derive(Debug, Clone)]
pub struct ImageData {
    /// The encoded image bytes.
    pub data: Bytes,
    /// The response `Content-Type`, when the server sent one.
    pub content_type: Option<String>,
}

/// Outcome shared between all callers attached to one in-flight request.
#[derive(Debug, Clone)]
struct RawFetched {
    payload: Bytes,
    response_url: Url,
    content_type: Option<String>,
    cache_status: CacheStatus,
}

type Outcome = Result<RawFetched, Error>;

/// The explicit form of a request; the verb methods on [`WebSession`] are
/// sugar over this.
///
/// ```
/// use websession::SessionRequest;
///
/// let request = SessionRequest::get("https://api.example.com/items")
///     .param("page", "2")
///     .header("X-Trace", "abc")
///     .ignore_cache(true);
/// ```
#[derive(Debug, Clone)]
pub struct SessionRequest {
    method: Method,
    url: String,
    params: Vec<(String, String)>,
    body: Option<Bytes>,
    content_type: Option<String>,
    headers: Vec<(String, String)>,
    ignore_cache: bool,
    /// Whether a successful response may be stored. GET without a body by
    /// default; downloads and image fetches opt out.
    pub(crate) store: bool,
}

impl SessionRequest {
    /// Creates a request with the given method and URL.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        let store = method == Method::GET;
        SessionRequest {
            method,
            url: url.into(),
            params: Vec::new(),
            body: None,
            content_type: None,
            headers: Vec::new(),
            ignore_cache: false,
            store,
        }
    }

    /// Creates a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Creates a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Adds one query parameter.
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    /// Adds query parameters. Order is irrelevant to request identity.
    pub fn params(mut self, params: &[(&str, &str)]) -> Self {
        self.params
            .extend(params.iter().map(|(n, v)| ((*n).to_owned(), (*v).to_owned())));
        self
    }

    /// Sets the request body and its content type. Requests with a body are
    /// never cached.
    pub fn body(mut self, body: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self.content_type = Some(content_type.into());
        self.store = false;
        self
    }

    /// Adds a per-request header. Wins over the session's additional
    /// headers on conflict; never participates in request identity.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Skips the cache read for this request. A successful cacheable
    /// response is still written, refreshing the stored entry.
    pub fn ignore_cache(mut self, ignore: bool) -> Self {
        self.ignore_cache = ignore;
        self
    }
}

/// A caching, deduplicating, retrying HTTP client session.
///
/// See the [crate docs](crate) for an overview and example. Construction
/// goes through [`WebSession::builder`]; a session without a cache store
/// simply fetches every time.
pub struct WebSession<T = ReqwestTransport> {
    transport: RetryingTransport<T>,
    cache: Option<Arc<dyn CacheStore>>,
    cache_age: Duration,
    additional_headers: HeaderMap,
    in_flight: InFlightRegistry<Outcome>,
}

impl WebSession<ReqwestTransport> {
    /// Creates a session with default configuration, no cache store, and a
    /// default `reqwest` transport.
    pub fn new() -> Self {
        WebSession {
            transport: RetryingTransport::new(
                ReqwestTransport::new(),
                crate::config::DEFAULT_RETRY_COUNT,
            ),
            cache: None,
            cache_age: crate::config::DEFAULT_CACHE_AGE,
            additional_headers: HeaderMap::new(),
            in_flight: InFlightRegistry::new(),
        }
    }

    /// Creates a builder with a default `reqwest` transport.
    pub fn builder() -> WebSessionBuilder<ReqwestTransport> {
        WebSessionBuilder {
            transport: ReqwestTransport::new(),
            cache: None,
            config: SessionConfig::default(),
        }
    }
}

impl Default for WebSession<ReqwestTransport> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Transport> WebSession<T> {
    /// Sends a GET request, serving from the cache when a fresh entry
    /// exists.
    pub async fn get(&self, url: &str, params: &[(&str, &str)]) -> Result<Fetched<Bytes>, Error> {
        self.request(SessionRequest::get(url).params(params)).await
    }

    /// Sends a GET request, bypassing the cache read. A successful
    /// response still refreshes the stored entry.
    pub async fn get_ignoring_cache(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Fetched<Bytes>, Error> {
        self.request(SessionRequest::get(url).params(params).ignore_cache(true))
            .await
    }

    /// Sends a GET request and decodes the response as JSON.
    pub async fn get_json(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Fetched<serde_json::Value>, Error> {
        decode_json(self.request(SessionRequest::get(url).params(params)).await?)
    }

    /// Sends a GET request bypassing the cache read and decodes the
    /// response as JSON.
    pub async fn get_json_ignoring_cache(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Fetched<serde_json::Value>, Error> {
        decode_json(
            self.request(SessionRequest::get(url).params(params).ignore_cache(true))
                .await?,
        )
    }

    /// Sends a POST request with form-encoded parameters in the body.
    pub async fn post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Fetched<Bytes>, Error> {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter().copied())
            .finish();
        self.request(SessionRequest::post(url).body(body, "application/x-www-form-urlencoded"))
            .await
    }

    /// Sends a POST request with a JSON body and decodes the response as
    /// JSON.
    pub async fn post_json(
        &self,
        url: &str,
        json: &serde_json::Value,
    ) -> Result<Fetched<serde_json::Value>, Error> {
        let body = serde_json::to_vec(json).map_err(|error| Error::Json(Arc::new(error)))?;
        decode_json(
            self.request(SessionRequest::post(url).body(body, "application/json"))
                .await?,
        )
    }

    /// Sends a POST request with an arbitrary body and content type.
    pub async fn post_data(
        &self,
        url: &str,
        data: impl Into<Bytes>,
        content_type: &str,
    ) -> Result<Fetched<Bytes>, Error> {
        self.request(SessionRequest::post(url).body(data, content_type))
            .await
    }

    /// Downloads the resource at `url` into a temporary file.
    ///
    /// The file is deleted when the returned [`DownloadedFile`] is dropped;
    /// [`persist`](DownloadedFile::persist) moves it out of temporary
    /// lifecycle. Downloads are never cached but concurrent downloads of
    /// the same resource share one network call.
    pub async fn download_file(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Fetched<DownloadedFile>, Error> {
        let mut request = SessionRequest::get(url).params(params);
        request.store = false;
        let raw = self.execute(request).await?;
        let file = DownloadedFile::materialize(raw.payload).await?;
        Ok(Fetched {
            data: file,
            response_url: raw.response_url,
            cache_status: raw.cache_status,
        })
    }

    /// Fetches the image at `url` without decoding it.
    pub async fn image(
        &self,
        url: &str,
        params: &[(&str, &str)],
    ) -> Result<Fetched<ImageData>, Error> {
        let mut request = SessionRequest::get(url).params(params);
        request.store = false;
        let raw = self.execute(request).await?;
        Ok(Fetched {
            data: ImageData {
                data: raw.payload,
                content_type: raw.content_type,
            },
            response_url: raw.response_url,
            cache_status: raw.cache_status,
        })
    }

    /// Sends an explicitly built request.
    pub async fn request(&self, request: SessionRequest) -> Result<Fetched<Bytes>, Error> {
        let raw = self.execute(request).await?;
        Ok(Fetched {
            data: raw.payload,
            response_url: raw.response_url,
            cache_status: raw.cache_status,
        })
    }

    /// Cache, then registry, then transport, all keyed consistently.
    async fn execute(&self, request: SessionRequest) -> Outcome {
        let base_url = Url::parse(&request.url)?;
        let params: Vec<(&str, &str)> = request
            .params
            .iter()
            .map(|(n, v)| (n.as_str(), v.as_str()))
            .collect();
        let key = RequestKey::derive(&request.method, &base_url, &params, request.body.as_deref());

        let cacheable = request.store;
        if cacheable
            && !request.ignore_cache
            && let Some(store) = &self.cache
        {
            match store.read(&key).await {
                Ok(Some(entry)) if entry.state() == CacheState::Fresh => {
                    debug!(%key, "cache hit");
                    let (payload, response_url) = entry.into_parts();
                    return Ok(RawFetched {
                        payload,
                        response_url,
                        content_type: None,
                        cache_status: CacheStatus::Hit,
                    });
                }
                Ok(_) => debug!(%key, "cache miss"),
                Err(error) => {
                    warn!(store = store.name(), %error, "cache read failed, treating as miss");
                }
            }
        }

        let transport_request = self.build_transport_request(&request, base_url)?;

        match self.in_flight.begin_or_attach(&key) {
            Flight::Attached(receiver) => {
                debug!(%key, "attached to in-flight request");
                receiver.await.map_err(|_| Error::Abandoned)?
            }
            Flight::Owner(permit) => {
                let outcome = self.fetch(&transport_request, &key, cacheable).await;
                permit.complete(outcome)
            }
        }
    }

    /// Owner path: perform the (retried) exchange and populate the cache.
    async fn fetch(
        &self,
        request: &TransportRequest,
        key: &RequestKey,
        cacheable: bool,
    ) -> Outcome {
        let response = self.transport.execute(request).await?;
        let content_type = response
            .headers
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);

        if cacheable && let Some(store) = &self.cache {
            let entry = CacheEntry::new(
                response.body.clone(),
                response.response_url.clone(),
                self.cache_age,
            );
            if let Err(error) = store.write(key, entry, self.cache_age).await {
                warn!(store = store.name(), %error, "cache write failed, result still delivered");
            }
        }

        Ok(RawFetched {
            payload: response.body,
            response_url: response.response_url,
            content_type,
            cache_status: CacheStatus::Miss,
        })
    }

    /// Merges headers (session extras lose to per-request headers) and
    /// appends query parameters. Headers never feed into the request key.
    fn build_transport_request(
        &self,
        request: &SessionRequest,
        base_url: Url,
    ) -> Result<TransportRequest, Error> {
        let mut url = base_url;
        if !request.params.is_empty() {
            url.query_pairs_mut().extend_pairs(
                request
                    .params
                    .iter()
                    .map(|(n, v)| (n.as_str(), v.as_str())),
            );
        }

        let mut headers = self.additional_headers.clone();
        if let Some(content_type) = &request.content_type {
            headers.insert(CONTENT_TYPE, parse_header_value(content_type)?);
        }
        for (name, value) in &request.headers {
            headers.insert(parse_header_name(name)?, parse_header_value(value)?);
        }

        Ok(TransportRequest {
            method: request.method.clone(),
            url,
            headers,
            body: request.body.clone(),
        })
    }
}

/// Builder for [`WebSession`].
pub struct WebSessionBuilder<T = ReqwestTransport> {
    transport: T,
    cache: Option<Arc<dyn CacheStore>>,
    config: SessionConfig,
}

impl<T> WebSessionBuilder<T> {
    /// Replaces the transport.
    pub fn transport<U: Transport>(self, transport: U) -> WebSessionBuilder<U> {
        WebSessionBuilder {
            transport,
            cache: self.cache,
            config: self.config,
        }
    }

    /// Sets the cache store. Without one, caching is disabled entirely and
    /// every request behaves as if it ignored the cache.
    pub fn cache(mut self, store: impl CacheStore + 'static) -> Self {
        self.cache = Some(Arc::new(store));
        self
    }

    /// Sets how long cached responses stay fresh.
    pub fn cache_age(mut self, cache_age: Duration) -> Self {
        self.config.cache_age = cache_age;
        self
    }

    /// Sets the attempt ceiling for transport errors.
    pub fn retry_count(mut self, retry_count: NonZeroU32) -> Self {
        self.config.retry_count = retry_count;
        self
    }

    /// Adds a header field sent with every request.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.config
            .additional_headers
            .insert(name.into(), value.into());
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }
}

impl<T: Transport> WebSessionBuilder<T> {
    /// Builds the session, validating the configured header fields.
    pub fn build(self) -> Result<WebSession<T>, Error> {
        let additional_headers = header_map(&self.config.additional_headers)?;
        Ok(WebSession {
            transport: RetryingTransport::new(self.transport, self.config.retry_count),
            cache: self.cache,
            cache_age: self.config.cache_age,
            additional_headers,
            in_flight: InFlightRegistry::new(),
        })
    }
}

fn header_map(headers: &HashMap<String, String>) -> Result<HeaderMap, Error> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        map.insert(parse_header_name(name)?, parse_header_value(value)?);
    }
    Ok(map)
}

fn parse_header_name(name: &str) -> Result<HeaderName, Error> {
    name.parse::<HeaderName>()
        .map_err(|error| Error::Header(Arc::new(http::Error::from(error))))
}

fn parse_header_value(value: &str) -> Result<HeaderValue, Error> {
    value
        .parse::<HeaderValue>()
        .map_err(|error| Error::Header(Arc::new(http::Error::from(error))))
}

fn decode_json(fetched: Fetched<Bytes>) -> Result<Fetched<serde_json::Value>, Error> {
    let data = serde_json::from_slice(&fetched.data).map_err(|error| Error::Json(Arc::new(error)))?;
    Ok(Fetched {
        data,
        response_url: fetched.response_url,
        cache_status: fetched.cache_status,
    })
}
