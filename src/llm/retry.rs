//! Exponential backoff for model requests.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use tracing::warn;

/// How many times, and how patiently, a request is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_interval: Duration,
    pub max_interval: Duration,
}

impl Default for RetryPolicy {
    /// 3 total attempts, base 1s, max 30s.
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_interval: Duration::from_secs(1),
            max_interval: Duration::from_secs(30),
        }
    }
}

/// Retry an async operation with exponential backoff.
///
/// `attempt` runs up to `policy.max_attempts` times. Errors for which
/// `is_retryable` returns false are returned immediately. When every attempt
/// fails, `wrap_exhausted` converts the last error into the caller's
/// "retries exhausted" variant.
pub async fn retry_with_backoff<T, E, Fut, F, R, W>(
    policy: RetryPolicy,
    mut attempt: F,
    is_retryable: R,
    wrap_exhausted: W,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    R: Fn(&E) -> bool,
    W: FnOnce(E) -> E,
    E: Display,
{
    let mut backoff = ExponentialBackoff {
        initial_interval: policy.initial_interval,
        max_interval: policy.max_interval,
        max_elapsed_time: None,
        ..Default::default()
    };

    let max_attempts = policy.max_attempts.max(1);
    let mut attempts = 0;

    loop {
        attempts += 1;

        let err = match attempt().await {
            Ok(value) => return Ok(value),
            Err(e) => e,
        };

        if !is_retryable(&err) {
            return Err(err);
        }
        if attempts >= max_attempts {
            return Err(wrap_exhausted(err));
        }

        warn!("Attempt {}/{} failed: {}", attempts, max_attempts, err);
        if let Some(wait) = backoff.next_backoff() {
            tokio::time::sleep(wait).await;
        }
    }
}
