//! Error types and result handling for Shirabe operations.
//!
//! All operations return a [`Result<T>`] which is a type alias for
//! `std::result::Result<T, Error>`.
//!
//! Adapters classify every raw failure into this taxonomy before it escapes;
//! the aggregation layer never inspects a raw transport error. The taxonomy
//! matters because the orchestrator reacts differently per variant:
//!
//! - [`Validation`](Error::Validation) - bad input, terminal, never consumes
//!   a fallback attempt
//! - [`Timeout`](Error::Timeout) - provider too slow, advances fallback
//! - [`RateLimit`](Error::RateLimit) - provider throttling, bounded retry
//!   then fallback
//! - [`Network`](Error::Network) - connectivity/transport, bounded retry
//!   then fallback
//! - [`NotFound`](Error::NotFound) - valid id with no record, surfaced
//!   directly (id spaces are not interchangeable between providers)
//! - [`Malformed`](Error::Malformed) - unparseable provider response,
//!   advances fallback, never retried against the same provider
//! - [`Config`](Error::Config) - missing API key or similar, detected
//!   before any network call
//!
//! # Examples
//!
//! ```rust
//! use shirabe::{Error, Result};
//!
//! fn check(query: &str) -> Result<()> {
//!     if query.trim().is_empty() {
//!         return Err(Error::validation("query must not be empty"));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Type alias for Results with Shirabe errors.
pub type Result<T> = std::result::Result<T, Error>;

/// Comprehensive error type for all Shirabe operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid caller input, rejected before any network call.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A provider call exceeded its allotted time budget.
    #[error("Timeout after {elapsed_ms}ms waiting for provider '{provider}'")]
    Timeout { provider: String, elapsed_ms: u64 },

    /// Rate limiting from a provider.
    ///
    /// Optionally carries the number of seconds the provider asked us to
    /// wait, taken from its `Retry-After` header. The retry helper in
    /// [`net::retry`](crate::net::retry) prefers this declared delay over
    /// its computed backoff.
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimit { retry_after: Option<u64> },

    /// Network-related errors from HTTP operations.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Resource not found errors.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider returned a shape the adapter could not parse.
    #[error("Malformed response: {0}")]
    Malformed(String),

    /// Missing or invalid configuration (e.g. absent API key).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Provider-specific errors with contextual information.
    #[error("Provider error [{src}]: {message}")]
    Provider { src: String, message: String },

    /// JSON serialization and deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error messages.
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Creates a validation error with the given message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Creates a timeout error for the given provider.
    pub fn timeout(provider: impl Into<String>, elapsed_ms: u64) -> Self {
        Error::Timeout {
            provider: provider.into(),
            elapsed_ms,
        }
    }

    /// Creates a rate limit error with optional retry-after time in seconds.
    pub fn rate_limit(retry_after: Option<u64>) -> Self {
        Error::RateLimit { retry_after }
    }

    /// Creates a not found error with the given message.
    pub fn not_found(msg: impl Into<String>) -> Self {
        Error::NotFound(msg.into())
    }

    /// Creates a malformed-response error with the given message.
    pub fn malformed(msg: impl Into<String>) -> Self {
        Error::Malformed(msg.into())
    }

    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Creates a provider-specific error with provider ID and message.
    pub fn provider(src: impl Into<String>, msg: impl Into<String>) -> Self {
        Error::Provider {
            src: src.into(),
            message: msg.into(),
        }
    }

    /// Whether a bounded retry against the same provider can help.
    ///
    /// Rate limiting and transient network failures are worth retrying;
    /// everything else either cannot change on retry (validation, malformed
    /// shapes, missing records, missing keys) or is already a timeout.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::RateLimit { .. } | Error::Network(_))
    }
}
