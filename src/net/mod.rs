//! Network utilities for HTTP requests, rate limiting, and backoff.
//!
//! This module provides the networking infrastructure for Shirabe:
//!
//! - **HTTP Client**: a global, configured HTTP client with connection pooling
//! - **Rate Limiting**: per-provider request spacing to respect API policies
//! - **Retry**: the generic exponential-backoff helper in [`retry`]
//! - **JSON helpers**: dot-path extraction for raw payloads in [`json`]
//!
//! HTTP failures are classified into the crate's error taxonomy here, at the
//! transport boundary: 429 becomes [`Error::RateLimit`] (with any declared
//! `Retry-After`), 404 becomes [`Error::NotFound`], 401/403 become
//! [`Error::Provider`] auth failures. Adapters decide which of those are
//! worth retrying by composing [`retry::retry`] with a predicate.
//!
//! # Examples
//!
//! ```rust
//! use shirabe::net::HttpClient;
//!
//! # async fn example() -> shirabe::Result<()> {
//! let client = HttpClient::new("kitsu")
//!     .with_rate_limit(400)
//!     .with_header("Accept", "application/vnd.api+json");
//!
//! let body: serde_json::Value = client.get_json("https://kitsu.io/api/edge/anime").await?;
//! # Ok(())
//! # }
//! ```

use bytes::Bytes;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use reqwest::{Client, header::HeaderMap};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::error::Error;

pub mod json;
pub mod retry;

/// Global HTTP client instance with optimized configuration.
///
/// Created lazily on first use and shared across all providers: 30-second
/// transport timeout, connection pooling, gzip/brotli compression, and a
/// crate User-Agent.
static CLIENT: Lazy<Client> = Lazy::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent("Shirabe/0.1.0")
        .pool_max_idle_per_host(10)
        .gzip(true)
        .brotli(true)
        .build()
        .expect("Failed to build HTTP client")
});

/// Per-provider rate limiter enforcing a minimum delay between requests.
///
/// Tracks the last request instant per provider id and sleeps when a new
/// request comes in too early. Uses a `Mutex` internally and is safe to
/// share across async tasks.
#[derive(Debug)]
pub struct RateLimiter {
    last_request: Mutex<HashMap<String, Instant>>,
    default_delay: Duration,
}

impl Clone for RateLimiter {
    fn clone(&self) -> Self {
        Self {
            last_request: Mutex::new(HashMap::new()),
            default_delay: self.default_delay,
        }
    }
}

impl RateLimiter {
    /// Creates a new rate limiter with the specified default delay.
    pub fn new(delay_ms: u64) -> Self {
        Self {
            last_request: Mutex::new(HashMap::new()),
            default_delay: Duration::from_millis(delay_ms),
        }
    }

    /// Waits if necessary before allowing a request for the given provider.
    pub async fn wait(&self, provider_id: &str) {
        let now = Instant::now();
        let wait_duration = {
            let last_map = self.last_request.lock();
            if let Some(&last) = last_map.get(provider_id) {
                let elapsed = now.duration_since(last);
                if elapsed < self.default_delay {
                    Some(self.default_delay - elapsed)
                } else {
                    None
                }
            } else {
                None
            }
        };

        if let Some(duration) = wait_duration {
            tokio::time::sleep(duration).await;
        }

        self.last_request
            .lock()
            .insert(provider_id.to_string(), Instant::now());
    }
}

/// HTTP client wrapper with built-in per-provider rate limiting.
///
/// Each provider adapter owns one `HttpClient` configured with its own
/// request spacing and default headers. The client performs a single
/// attempt per call and classifies HTTP failures into the error taxonomy;
/// retry policy lives with the adapter, composed via [`retry::retry`].
#[derive(Clone, Debug)]
pub struct HttpClient {
    provider_id: String,
    rate_limiter: RateLimiter,
    headers: HeaderMap,
}

impl HttpClient {
    /// Creates a new HTTP client for the specified provider.
    ///
    /// Defaults to 200ms spacing between requests.
    pub fn new(provider_id: impl Into<String>) -> Self {
        Self {
            provider_id: provider_id.into(),
            rate_limiter: RateLimiter::new(200),
            headers: HeaderMap::new(),
        }
    }

    /// Sets the minimum delay between requests for this client.
    pub fn with_rate_limit(mut self, delay_ms: u64) -> Self {
        self.rate_limiter = RateLimiter::new(delay_ms);
        self
    }

    /// Adds a default header to all requests made by this client.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            name.parse::<reqwest::header::HeaderName>(),
            value.parse::<reqwest::header::HeaderValue>(),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Performs a rate-limited GET request.
    ///
    /// # Errors
    ///
    /// * [`Error::RateLimit`] - HTTP 429, carrying any declared `Retry-After`
    /// * [`Error::NotFound`] - HTTP 404
    /// * [`Error::Provider`] - other non-success statuses (auth, 5xx)
    /// * [`Error::Network`] - transport-level failures
    pub async fn get(&self, url: &str) -> crate::Result<Bytes> {
        self.rate_limiter.wait(&self.provider_id).await;

        let response = CLIENT.get(url).headers(self.headers.clone()).send().await?;
        self.classify(response).await
    }

    /// Performs a rate-limited POST request with a JSON body.
    ///
    /// Used by GraphQL providers that take a fixed query template plus
    /// variables in the request body.
    pub async fn post(&self, url: &str, body: &serde_json::Value) -> crate::Result<Bytes> {
        self.rate_limiter.wait(&self.provider_id).await;

        let response = CLIENT
            .post(url)
            .headers(self.headers.clone())
            .json(body)
            .send()
            .await?;
        self.classify(response).await
    }

    /// Performs a GET request and deserializes the response as JSON.
    pub async fn get_json<T>(&self, url: &str) -> crate::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let bytes = self.get(url).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::malformed(format!("{}: {}", self.provider_id, e)))
    }

    /// Performs a JSON POST request and deserializes the response as JSON.
    pub async fn post_json<T>(&self, url: &str, body: &serde_json::Value) -> crate::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let bytes = self.post(url, body).await?;
        serde_json::from_slice(&bytes)
            .map_err(|e| Error::malformed(format!("{}: {}", self.provider_id, e)))
    }

    /// Maps a response into body bytes or a classified error.
    async fn classify(&self, response: reqwest::Response) -> crate::Result<Bytes> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.bytes().await?);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            return Err(Error::rate_limit(retry_after));
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::not_found(format!(
                "{}: HTTP 404",
                self.provider_id
            )));
        }

        if status == reqwest::StatusCode::UNAUTHORIZED
            || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(Error::provider(
                &self.provider_id,
                format!("authentication failed: HTTP {}", status),
            ));
        }

        Err(Error::provider(
            &self.provider_id,
            format!("HTTP {}", status),
        ))
    }
}
