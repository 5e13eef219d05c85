use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::cache::ResponseCache;
use crate::error::AnnotError;

/// Delay applied before every real network request, out of politeness to
/// the upstream service. Cache hits never pay it.
pub const COURTESY_DELAY: Duration = Duration::from_secs(2);

/// A single "get text for URL" network call. No retries: a failure aborts
/// the current query and the caller decides whether the batch continues.
pub trait UrlFetcher: Send + Sync {
    fn fetch_text(&self, url: &str) -> Result<String, AnnotError>;
}

impl<F: UrlFetcher> UrlFetcher for &F {
    fn fetch_text(&self, url: &str) -> Result<String, AnnotError> {
        (**self).fetch_text(url)
    }
}

pub struct HttpFetcher {
    client: Client,
    delay: Duration,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, AnnotError> {
        Self::with_delay(COURTESY_DELAY)
    }

    pub fn with_delay(delay: Duration) -> Result<Self, AnnotError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("protannot/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| AnnotError::Http(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| AnnotError::Http(err.to_string()))?;
        Ok(Self { client, delay })
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, AnnotError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "UniProt request failed".to_string());
        Err(AnnotError::HttpStatus { status, message })
    }
}

impl UrlFetcher for HttpFetcher {
    fn fetch_text(&self, url: &str) -> Result<String, AnnotError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| AnnotError::Http(err.to_string()))?;
        let response = Self::handle_status(response)?;
        response.text().map_err(|err| AnnotError::Http(err.to_string()))
    }
}

/// Cache-first composition of [`ResponseCache`] and a [`UrlFetcher`].
///
/// Misses are written through to disk before the body is returned, so a
/// crash loses at most the in-flight request.
pub struct CachingFetcher<F: UrlFetcher> {
    cache: ResponseCache,
    fetcher: F,
}

impl<F: UrlFetcher> CachingFetcher<F> {
    pub fn new(cache: ResponseCache, fetcher: F) -> Self {
        Self { cache, fetcher }
    }

    pub fn resolve(&mut self, url: &str) -> Result<String, AnnotError> {
        if let Some(body) = self.cache.get(url) {
            tracing::info!(%url, "cache hit, reusing stored response");
            return Ok(body.to_string());
        }
        tracing::info!(%url, "cache miss, downloading");
        let body = self.fetcher.fetch_text(url)?;
        self.cache.put(url, &body)?;
        Ok(body)
    }
}
