use crate::feed::cache::{CacheProvider, NoCache};
use futures::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Default staleness window for cached feed documents (1 hour).
pub const DEFAULT_REVALIDATE: Duration = Duration::from_secs(60 * 60);

/// Errors that can occur while retrieving the feed document.
///
/// The fetcher never retries; callers decide what a failure means.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection refused, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
    /// Response was incomplete (received fewer bytes than Content-Length)
    #[error("Incomplete response: expected {expected} bytes, received {received}")]
    IncompleteResponse { expected: u64, received: usize },
}

/// Retrieves the configured feed document over HTTP.
///
/// Each call performs at most one GET. A [`CacheProvider`] supplied with
/// [`FeedFetcher::with_cache`] can answer instead of the network while its
/// document is younger than the revalidate window; with the default
/// [`NoCache`] every call hits the network.
#[derive(Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
    revalidate: Duration,
    cache: Arc<dyn CacheProvider>,
}

impl std::fmt::Debug for FeedFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FeedFetcher")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .field("revalidate", &self.revalidate)
            .finish_non_exhaustive()
    }
}

impl FeedFetcher {
    /// Creates a fetcher for `url` without a cache.
    ///
    /// `timeout` bounds the whole request, body included.
    pub fn new(client: reqwest::Client, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client,
            url: url.into(),
            timeout,
            revalidate: DEFAULT_REVALIDATE,
            cache: Arc::new(NoCache),
        }
    }

    /// Serves documents from `cache` while they are younger than `revalidate`.
    pub fn with_cache(mut self, cache: Arc<dyn CacheProvider>, revalidate: Duration) -> Self {
        self.cache = cache;
        self.revalidate = revalidate;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the raw feed document.
    ///
    /// Sends `Accept: application/xml` and a `Cache-Control: max-age` hint
    /// equal to the revalidate window, so HTTP caches in front of the feed
    /// can answer too.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - connection or TLS errors
    /// - [`FetchError::Timeout`] - request exceeded the configured timeout
    /// - [`FetchError::HttpStatus`] - non-2xx HTTP response
    /// - [`FetchError::ResponseTooLarge`] - body exceeded 10MB
    /// - [`FetchError::IncompleteResponse`] - body shorter than Content-Length
    pub async fn fetch(&self) -> Result<Vec<u8>, FetchError> {
        if let Some(document) = self.cache.get(&self.url, self.revalidate) {
            tracing::debug!(url = %self.url, bytes = document.len(), "Serving feed from cache");
            return Ok(document);
        }

        let document = tokio::time::timeout(self.timeout, self.fetch_fresh())
            .await
            .map_err(|_| FetchError::Timeout)??;

        tracing::debug!(url = %self.url, bytes = document.len(), "Fetched feed");
        self.cache.put(&self.url, document.clone());
        Ok(document)
    }

    async fn fetch_fresh(&self) -> Result<Vec<u8>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .header(ACCEPT, "application/xml")
            .header(
                CACHE_CONTROL,
                format!("max-age={}", self.revalidate.as_secs()),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        read_limited_bytes(response, MAX_FEED_SIZE).await
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Capture Content-Length for completeness check
    let expected_length = response.content_length();

    // Fast path: check Content-Length header
    if let Some(len) = expected_length {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    ensure_complete(expected_length, bytes.len())?;
    Ok(bytes)
}

/// Rejects a body shorter than its declared `Content-Length`.
///
/// hyper normally reports a connection closed mid-body as a transport error,
/// which surfaces as [`FetchError::Network`] from the stream. This catches a
/// short body that ended cleanly anyway.
fn ensure_complete(expected: Option<u64>, received: usize) -> Result<(), FetchError> {
    match expected {
        Some(expected) if (received as u64) < expected => {
            Err(FetchError::IncompleteResponse { expected, received })
        }
        _ => Ok(()),
    }
}
