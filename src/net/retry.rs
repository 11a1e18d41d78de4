//! Generic exponential-backoff retry helper.
//!
//! The helper knows nothing about HTTP statuses or provider semantics; the
//! caller supplies a predicate deciding which errors are worth retrying.
//! Adapters compose it with their own trigger conditions (e.g. Jikan retries
//! rate limiting and transient network failures, but never a malformed
//! response, because retrying cannot change the shape).
//!
//! # Examples
//!
//! ```rust
//! use std::time::Duration;
//! use shirabe::net::retry::retry;
//!
//! # async fn example() -> shirabe::Result<()> {
//! let value = retry(
//!     || async { Ok::<_, shirabe::Error>(42) },
//!     3,
//!     Duration::from_millis(250),
//!     |e| e.is_retryable(),
//! )
//! .await?;
//! assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::time::Duration;

use tracing::debug;

use crate::error::{Error, Result};

/// Runs `operation` up to `max_attempts + 1` times total.
///
/// After a retryable failure the helper sleeps `base_delay * 2^attempt`
/// before the next try. When the failed attempt carried a provider-declared
/// wait ([`Error::RateLimit`] with `retry_after`), that declared delay is
/// used instead of the computed backoff for that one attempt. Exhausting
/// all attempts, or hitting a non-retryable error, re-raises the last error.
pub async fn retry<T, F, Fut, P>(
    operation: F,
    max_attempts: u32,
    base_delay: Duration,
    is_retryable: P,
) -> Result<T>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T>>,
    P: Fn(&Error) -> bool,
{
    let mut attempt = 0u32;

    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if attempt >= max_attempts || !is_retryable(&err) {
                    return Err(err);
                }

                let delay = match &err {
                    Error::RateLimit {
                        retry_after: Some(seconds),
                    } => Duration::from_secs(*seconds),
                    _ => base_delay * 2u32.pow(attempt),
                };

                debug!(
                    attempt = attempt + 1,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "retrying after failure"
                );

                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}
