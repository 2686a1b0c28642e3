//! Bounded retry with exponential backoff.
//!
//! This is the only place retries happen; layers above the orchestrator must
//! not retry again. Classification relies entirely on the tagged
//! [`ApiError`](crate::api::ApiError) variants, never on message contents.

use std::future::Future;

use rand::Rng;
use tokio::time::{Duration, sleep, timeout};

use crate::api::ApiError;
use crate::error::{GatewayError, Result};

/// Retry schedule for one logical external call.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total attempt budget, including the first attempt.
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Ceiling applied to each individual attempt. Keep this strictly below
    /// the caller's overall deadline divided by `max_attempts`.
    pub per_attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            per_attempt_timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Runs `operation` until it succeeds, fails permanently, or exhausts
    /// the attempt budget.
    ///
    /// Transient failures and attempt timeouts back off exponentially with
    /// jitter before the next attempt. A permanent failure returns
    /// immediately. Exhaustion wraps the last transient cause in
    /// [`GatewayError::RetriesExhausted`].
    pub async fn execute<T, F, Fut>(&self, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = std::result::Result<T, ApiError>>,
    {
        let mut last_error = String::new();

        for attempt in 0..self.max_attempts {
            match timeout(self.per_attempt_timeout, operation()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(ApiError::Permanent(message))) => {
                    tracing::debug!(attempt, %message, "permanent failure, not retrying");
                    return Err(GatewayError::Permanent(message));
                }
                Ok(Err(ApiError::Transient(message))) => {
                    tracing::warn!(attempt, %message, "transient failure");
                    last_error = message;
                }
                Err(_) => {
                    tracing::warn!(attempt, "attempt timed out");
                    last_error = format!(
                        "attempt timed out after {}s",
                        self.per_attempt_timeout.as_secs()
                    );
                }
            }

            if attempt + 1 < self.max_attempts {
                let delay = self.backoff_delay(attempt);
                tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "backing off");
                sleep(delay).await;
            }
        }

        Err(GatewayError::RetriesExhausted {
            attempts: self.max_attempts,
            last_error,
        })
    }

    /// `min(max_delay, base_delay * 2^attempt) * random(0.5, 1.5)`.
    fn backoff_delay(&self, attempt: u32) -> Duration {
        let exponential = self.base_delay.as_secs_f64() * 2f64.powi(attempt as i32);
        let capped = exponential.min(self.max_delay.as_secs_f64());
        let jitter = rand::thread_rng().gen_range(0.5..=1.5);
        Duration::from_secs_f64(capped * jitter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            base_delay: Duration::from_millis(10),
            max_delay: Duration::from_millis(100),
            per_attempt_timeout: Duration::from_secs(5),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_after_transient_failures() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result = policy(4)
            .execute(move || {
                let calls = counter.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(ApiError::transient("503"))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_wraps_last_transient_cause() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = policy(4)
            .execute(move || {
                let calls = counter.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::transient(format!("failure {n}")))
                }
            })
            .await;

        match result.unwrap_err() {
            GatewayError::RetriesExhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 4);
                assert_eq!(last_error, "failure 3");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_permanent_failure_makes_exactly_one_attempt() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();

        let result: Result<()> = policy(4)
            .execute(move || {
                let calls = counter.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(ApiError::permanent("404"))
                }
            })
            .await;

        assert!(matches!(result.unwrap_err(), GatewayError::Permanent(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout_counts_as_transient() {
        let calls = Arc::new(AtomicU32::new(0));
        let counter = calls.clone();
        let policy = RetryPolicy {
            per_attempt_timeout: Duration::from_millis(50),
            ..policy(2)
        };

        let result: Result<()> = policy
            .execute(move || {
                let calls = counter.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    sleep(Duration::from_secs(3_600)).await;
                    Ok(())
                }
            })
            .await;

        match result.unwrap_err() {
            GatewayError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 2),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
