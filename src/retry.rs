//! Retry logic for transient lookup failures
//!
//! This module provides the retry policy applied inside the lookup client:
//! a bounded number of attempts with a fixed inter-attempt delay, optionally
//! grown by a backoff multiplier.
//!
//! # Example
//!
//! ```no_run
//! use rowfetch::config::RetryConfig;
//! use rowfetch::error::LookupError;
//! use rowfetch::retry::call_with_retry;
//!
//! # async fn example() -> Result<(), LookupError> {
//! let policy = RetryConfig::default();
//! let value = call_with_retry(&policy, || async {
//!     // Your operation here
//!     Ok::<_, LookupError>(42)
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::LookupError;
use std::future::Future;
use std::time::Duration;

/// Trait for errors that can be classified as retryable or not
///
/// Transient failures (connection errors, timeouts, server errors) should return `true`.
/// Permanent failures (malformed payloads, cancellation) should return `false`.
pub trait IsRetryable {
    /// Returns true if the error is transient and the operation should be retried
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for LookupError {
    fn is_retryable(&self) -> bool {
        match self {
            // Transport failures and non-2xx statuses may clear up on a later attempt.
            // A misconfigured endpoint fails the same way a down server does, so it
            // burns the full retry budget before turning terminal.
            LookupError::Request { .. } | LookupError::Status { .. } => true,
            // A malformed success body replays identically on every attempt
            LookupError::MalformedBody { .. } | LookupError::NotAnObject { .. } => false,
            // Cancellation means another row already failed terminally
            LookupError::Cancelled { .. } => false,
        }
    }
}

/// Execute an async operation under the given retry policy
///
/// # Arguments
///
/// * `config` - Retry policy (max attempts, inter-attempt delay, backoff multiplier)
/// * `operation` - Async closure returning `Result<T, E>` where `E` implements [`IsRetryable`]
///
/// # Returns
///
/// The successful result, or the last error once the attempt budget is
/// exhausted or a non-retryable error occurs.
pub async fn call_with_retry<F, Fut, T, E>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut attempt = 0;
    let mut delay = config.delay;

    loop {
        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    tracing::info!(attempts = attempt + 1, "operation succeeded after retry");
                }
                return Ok(result);
            }
            Err(e) if e.is_retryable() && attempt < config.max_attempts => {
                attempt += 1;

                tracing::warn!(
                    error = %e,
                    attempt = attempt,
                    max_attempts = config.max_attempts,
                    delay_ms = delay.as_millis(),
                    "operation failed, retrying"
                );

                tokio::time::sleep(delay).await;

                delay = Duration::from_secs_f64(delay.as_secs_f64() * config.backoff_multiplier);
            }
            Err(e) => {
                if e.is_retryable() {
                    tracing::error!(
                        error = %e,
                        attempts = attempt + 1,
                        "operation failed after all retry attempts exhausted"
                    );
                } else {
                    tracing::error!(
                        error = %e,
                        "operation failed with non-retryable error"
                    );
                }
                return Err(e);
            }
        }
    }
}
