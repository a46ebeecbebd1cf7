//! Retry with exponential backoff and jitter
//!
//! Listing requests are retried on transient failures (timeouts, throttling,
//! 5xx responses) so a hiccup between two pages does not abort a replication.

use std::future::Future;
use std::time::Duration;

use crate::config::RetryConfig;
use crate::error::{Error, Result};

/// Run `operation` until it succeeds, fails with a non-retryable error, or
/// `config.max_attempts` is reached
///
/// # Example
/// ```ignore
/// let page = retry_with_backoff(
///     &config,
///     || store.list_objects(bucket, prefix, cursor),
///     is_retryable_error,
/// ).await?;
/// ```
pub async fn retry_with_backoff<T, F, Fut, R>(
    config: &RetryConfig,
    mut operation: F,
    is_retryable: R,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
    R: Fn(&Error) -> bool,
{
    let max_attempts = config.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;

        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if attempt >= max_attempts || !is_retryable(&err) {
            return Err(err);
        }

        let backoff = backoff_for(config, attempt);
        tracing::debug!(
            attempt,
            max_attempts,
            backoff_ms = backoff.as_millis() as u64,
            error = %err,
            "Transient store error, retrying"
        );
        tokio::time::sleep(backoff).await;
    }
}

/// Backoff before the attempt following `attempt`: `initial * 2^(attempt-1)`,
/// capped at `max_backoff_ms`, plus up to the same amount of jitter
fn backoff_for(config: &RetryConfig, attempt: u32) -> Duration {
    let exponent = attempt.saturating_sub(1).min(10);
    let capped_ms = config
        .initial_backoff_ms
        .saturating_mul(1u64 << exponent)
        .min(config.max_backoff_ms);

    Duration::from_millis(capped_ms + jitter(capped_ms))
}

fn jitter(max: u64) -> u64 {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos() as u64;
    nanos % max.max(1)
}

/// Whether a store error is transient and worth another attempt
pub fn is_retryable_error(error: &Error) -> bool {
    match error {
        Error::Network(msg) => {
            let msg = msg.to_lowercase();
            [
                "timeout",
                "timed out",
                "connection reset",
                "connection refused",
                "dispatch",
                "500",
                "502",
                "503",
                "504",
                "internal error",
                "service unavailable",
                "too many requests",
                "429",
                "slow down",
                "slowdown",
            ]
            .iter()
            .any(|needle| msg.contains(needle))
        }
        Error::Io(e) => matches!(
            e.kind(),
            std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::TimedOut
                | std::io::ErrorKind::Interrupted
        ),
        Error::Validation(_)
        | Error::Listing { .. }
        | Error::MalformedListing(_)
        | Error::Auth(_)
        | Error::NotFound(_)
        | Error::Config(_)
        | Error::TomlParse(_)
        | Error::DeadlineExceeded { .. }
        | Error::General(_) => false,
    }
}
