// Retry loop shared by every page fetch.
//
// Delays grow linearly with the retry number; only errors classified as
// retryable by `FetchError::is_retryable` are attempted again.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::error::FetchError;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts (not counting the initial attempt).
    pub max_retries: u32,
    /// The n-th retry waits `n * base_delay`.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Delay before retry number `retry` (1-indexed).
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(retry)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the retry budget is spent.
///
/// The closure receives the 0-indexed attempt number.
pub async fn retry_with_backoff<F, Fut, T>(
    policy: &RetryPolicy,
    url: &str,
    operation: F,
) -> Result<T, FetchError>
where
    F: Fn(u32) -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let mut attempt = 0;
    loop {
        match operation(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if !err.is_retryable() => return Err(err),
            Err(err) => {
                if attempt >= policy.max_retries {
                    return Err(FetchError::RetriesExhausted {
                        url: url.to_string(),
                        attempts: attempt + 1,
                        last: Box::new(err),
                    });
                }
                attempt += 1;
                let delay = policy.delay_for_retry(attempt);
                warn!(
                    url = %url,
                    attempt,
                    max = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retrying after transient error"
                );
                tokio::time::sleep(delay).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn unavailable() -> FetchError {
        FetchError::Status {
            url: "https://a".to_string(),
            status: StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    #[test]
    fn delay_grows_linearly() {
        let policy = RetryPolicy::new(3, Duration::from_millis(100));
        assert_eq!(policy.delay_for_retry(1), Duration::from_millis(100));
        assert_eq!(policy.delay_for_retry(2), Duration::from_millis(200));
        assert_eq!(policy.delay_for_retry(3), Duration::from_millis(300));
    }

    #[tokio::test]
    async fn retry_succeeds_on_first_attempt() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let result = retry_with_backoff(&policy, "https://a", |_| async { Ok(42u32) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn retry_fails_immediately_on_client_error() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let attempts = AtomicU32::new(0);
        let result: Result<u32, _> = retry_with_backoff(&policy, "https://a", |_| {
            attempts.fetch_add(1, Ordering::Relaxed);
            async {
                Err(FetchError::Status {
                    url: "https://a".to_string(),
                    status: StatusCode::NOT_FOUND,
                })
            }
        })
        .await;
        assert!(matches!(result, Err(FetchError::Status { .. })));
        assert_eq!(attempts.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn retry_succeeds_on_third_attempt_with_increasing_delays() {
        let policy = RetryPolicy::new(3, Duration::from_millis(20));
        let attempts = AtomicU32::new(0);
        let started = tokio::time::Instant::now();
        let result = retry_with_backoff(&policy, "https://a", |attempt| {
            attempts.fetch_add(1, Ordering::Relaxed);
            async move {
                if attempt < 2 {
                    Err(unavailable())
                } else {
                    Ok("ok")
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), "ok");
        assert_eq!(attempts.load(Ordering::Relaxed), 3);
        // 20ms before the first retry, 40ms before the second.
        assert!(started.elapsed() >= Duration::from_millis(60));
    }

    #[tokio::test]
    async fn retry_exhausts_then_fails() {
        let policy = RetryPolicy::new(3, Duration::from_millis(1));
        let attempts = AtomicU32::new(0);
        let result: Result<u32, _> = retry_with_backoff(&policy, "https://a", |_| {
            attempts.fetch_add(1, Ordering::Relaxed);
            async { Err(unavailable()) }
        })
        .await;
        // Initial attempt + 3 retries = 4 total
        assert_eq!(attempts.load(Ordering::Relaxed), 4);
        match result {
            Err(FetchError::RetriesExhausted { attempts, last, .. }) => {
                assert_eq!(attempts, 4);
                assert!(matches!(*last, FetchError::Status { .. }));
            }
            other => panic!("expected exhausted retries, got {other:?}"),
        }
    }
}
