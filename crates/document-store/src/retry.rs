//! Bounded retry with exponential backoff and per-attempt deadlines.

use crate::error::StoreError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Maximum number of retries for transient errors
const MAX_RETRIES: u32 = 5;
/// Base delay between retries (doubled per attempt)
const RETRY_BASE_DELAY_MS: u64 = 100;
/// Upper bound for a single backoff delay
const RETRY_MAX_DELAY_MS: u64 = 1600;

/// Retry policy wrapped around every store call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub base_delay: Duration,
    /// Cap on computed and server supplied delays
    pub max_delay: Duration,
    /// Deadline for each attempt; `None` waits for the store
    pub attempt_timeout: Option<Duration>,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: Duration::from_millis(RETRY_BASE_DELAY_MS),
            max_delay: Duration::from_millis(RETRY_MAX_DELAY_MS),
            attempt_timeout: None,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no deadline.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_attempt_timeout(mut self, attempt_timeout: Option<Duration>) -> Self {
        self.attempt_timeout = attempt_timeout;
        self
    }

    /// Backoff before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u32 << attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }

    /// Run `op`, retrying transient failures.
    ///
    /// Non-transient errors are returned immediately. A server supplied
    /// retry-after hint takes precedence over the computed backoff.
    pub async fn run<T, F, Fut>(&self, operation: &str, mut op: F) -> Result<T, StoreError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, StoreError>>,
    {
        let mut attempt = 0;
        loop {
            let result = match self.attempt_timeout {
                Some(deadline) => match timeout(deadline, op()).await {
                    Ok(result) => result,
                    Err(_) => Err(StoreError::Timeout(deadline)),
                },
                None => op().await,
            };

            match result {
                Ok(value) => return Ok(value),
                Err(e) if e.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    let delay = e
                        .retry_after()
                        .map(|d| d.min(self.max_delay))
                        .unwrap_or_else(|| self.backoff(attempt));
                    tracing::warn!(
                        "Retrying {} (attempt {}/{}) after {:?}: {}",
                        operation,
                        attempt,
                        self.max_retries,
                        delay,
                        e
                    );
                    sleep(delay).await;
                }
                Err(e) => {
                    if e.is_transient() {
                        tracing::error!(
                            "Giving up on {} after {} retries: {}",
                            operation,
                            attempt,
                            e
                        );
                    }
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast() -> RetryPolicy {
        RetryPolicy::default().with_base_delay(Duration::from_millis(1))
    }

    #[test]
    fn test_backoff_is_exponential_and_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(100));
        assert_eq!(policy.backoff(2), Duration::from_millis(200));
        assert_eq!(policy.backoff(3), Duration::from_millis(400));
        assert_eq!(policy.backoff(5), Duration::from_millis(1600));
        assert_eq!(policy.backoff(30), Duration::from_millis(1600));
    }

    #[tokio::test]
    async fn test_retries_transient_until_success() {
        let calls = AtomicU32::new(0);
        let result = fast()
            .run("upsert", || async {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(StoreError::Transient("503".into()))
                } else {
                    Ok(7)
                }
            })
            .await;

        assert_eq!(result, Ok(7));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_max_retries() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast()
            .with_max_retries(2)
            .run("upsert", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::Throttled { retry_after: None })
            })
            .await;

        assert_eq!(result, Err(StoreError::Throttled { retry_after: None }));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_does_not_retry_permanent_errors() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = fast()
            .run("point_read", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err(StoreError::NotFound("item".into()))
            })
            .await;

        assert!(matches!(result, Err(StoreError::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = RetryPolicy::none()
            .with_attempt_timeout(Some(Duration::from_millis(50)))
            .run("query", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;

        assert_eq!(result, Err(StoreError::Timeout(Duration::from_millis(50))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_honors_retry_after() {
        let calls = AtomicU32::new(0);
        let started = tokio::time::Instant::now();
        let result = RetryPolicy::default()
            .run("upsert", || async {
                if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(StoreError::Throttled {
                        retry_after: Some(Duration::from_millis(750)),
                    })
                } else {
                    Ok(())
                }
            })
            .await;

        assert!(result.is_ok());
        assert!(started.elapsed() >= Duration::from_millis(750));
    }
}
