use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Bounded retry with exponential backoff.
///
/// The policy owns the attempt budget and the backoff schedule; callers
/// supply the predicate deciding which errors are worth another attempt.
/// With the default policy the delays between the three attempts are 2s
/// and then 4s.
///
/// ```
/// use cinebot::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts(), 3);
/// assert_eq!(policy.delay_before_retry(1), Duration::from_secs(2));
/// assert_eq!(policy.delay_before_retry(2), Duration::from_secs(4));
///
/// assert_eq!(RetryPolicy::no_retry().max_attempts(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(2),
            multiplier: 2,
        }
    }
}

/// Why a retried operation gave up.
#[derive(Debug, Clone, PartialEq)]
pub enum RetryError<E> {
    /// Every attempt failed with a retryable error
    Exhausted { attempts: u32, last_error: E },
    /// An attempt failed with an error the predicate refused to retry
    Permanent { attempt: u32, error: E },
}

impl RetryPolicy {
    /// `max_attempts` counts the first attempt; it is clamped to at least 1.
    pub fn new(max_attempts: u32, base_delay: Duration, multiplier: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            multiplier: multiplier.max(1),
        }
    }

    /// A single attempt, never retried.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, 1)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay before the `retry`-th retry (1-based): `base * multiplier^(retry - 1)`.
    pub fn delay_before_retry(&self, retry: u32) -> Duration {
        let factor = self.multiplier.saturating_pow(retry.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Run `operation` until it succeeds, fails with an error `is_retryable`
    /// rejects, or the attempt budget runs out.
    pub async fn run<T, E, F, Fut, P>(
        &self,
        operation: &str,
        mut attempt_fn: F,
        is_retryable: P,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: Fn(&E) -> bool,
        E: std::fmt::Display,
    {
        let mut attempt = 1;
        loop {
            debug!(
                operation,
                attempt,
                total_attempts = self.max_attempts,
                "Attempt"
            );

            match attempt_fn().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!(operation, attempts_used = attempt, "Succeeded after retrying");
                    }
                    return Ok(value);
                }
                Err(err) if !is_retryable(&err) => {
                    error!(operation, attempt, error = %err, "Non-retryable failure");
                    return Err(RetryError::Permanent {
                        attempt,
                        error: err,
                    });
                }
                Err(err) if attempt >= self.max_attempts => {
                    error!(
                        operation,
                        attempts = attempt,
                        error = %err,
                        "Failed after maximum retry attempts"
                    );
                    return Err(RetryError::Exhausted {
                        attempts: attempt,
                        last_error: err,
                    });
                }
                Err(err) => {
                    let delay = self.delay_before_retry(attempt);
                    warn!(
                        operation,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Transient failure, backing off"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn fast_policy(attempts: u32) -> RetryPolicy {
        RetryPolicy::new(attempts, Duration::from_millis(1), 2)
    }

    #[test]
    fn test_backoff_schedule() {
        let policy = RetryPolicy::new(5, Duration::from_millis(100), 3);
        assert_eq!(policy.delay_before_retry(1), Duration::from_millis(100));
        assert_eq!(policy.delay_before_retry(2), Duration::from_millis(300));
        assert_eq!(policy.delay_before_retry(3), Duration::from_millis(900));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO, 2).max_attempts(), 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let calls = Cell::new(0);
        let result: Result<&str, RetryError<String>> = fast_policy(3)
            .run(
                "test",
                || {
                    calls.set(calls.get() + 1);
                    let n = calls.get();
                    async move {
                        if n < 3 {
                            Err(format!("failure {n}"))
                        } else {
                            Ok("done")
                        }
                    }
                },
                |_| true,
            )
            .await;

        assert_eq!(result, Ok("done"));
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_exhausts_budget() {
        let calls = Cell::new(0);
        let result: Result<(), RetryError<String>> = fast_policy(3)
            .run(
                "test",
                || {
                    calls.set(calls.get() + 1);
                    async { Err("down".to_string()) }
                },
                |_| true,
            )
            .await;

        assert_eq!(
            result,
            Err(RetryError::Exhausted {
                attempts: 3,
                last_error: "down".to_string()
            })
        );
        assert_eq!(calls.get(), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_stops_immediately() {
        let calls = Cell::new(0);
        let result: Result<(), RetryError<String>> = fast_policy(3)
            .run(
                "test",
                || {
                    calls.set(calls.get() + 1);
                    async { Err("bad request".to_string()) }
                },
                |_| false,
            )
            .await;

        assert_eq!(
            result,
            Err(RetryError::Permanent {
                attempt: 1,
                error: "bad request".to_string()
            })
        );
        assert_eq!(calls.get(), 1);
    }

    #[tokio::test]
    async fn test_no_retry_policy_makes_one_attempt() {
        let calls = Cell::new(0);
        let result: Result<(), RetryError<String>> = RetryPolicy::no_retry()
            .run(
                "test",
                || {
                    calls.set(calls.get() + 1);
                    async { Err("timeout".to_string()) }
                },
                |_| true,
            )
            .await;

        assert!(matches!(result, Err(RetryError::Exhausted { attempts: 1, .. })));
        assert_eq!(calls.get(), 1);
    }
}
