//! Token-bucket rate limiter.
//!
//! Throttles outgoing call frequency independently of the quota budget. The
//! bucket refills continuously and lazily: elapsed time is converted into
//! tokens on each acquisition attempt.

use tokio::sync::Mutex;
use tokio::time::{Duration, Instant, sleep};

struct BucketState {
    tokens: f64,
    last_refill: Instant,
}

/// A token-bucket limiter. `acquire` suspends until tokens are available;
/// it never fails.
pub struct RateLimiter {
    max_tokens: f64,
    refill_rate: f64,
    state: Mutex<BucketState>,
}

impl RateLimiter {
    /// Creates a full bucket.
    ///
    /// `refill_rate` is in tokens per second; `max_tokens` bounds the burst
    /// size.
    pub fn new(refill_rate: f64, max_tokens: f64) -> Self {
        Self {
            max_tokens,
            refill_rate,
            state: Mutex::new(BucketState {
                tokens: max_tokens,
                last_refill: Instant::now(),
            }),
        }
    }

    /// Acquires `tokens` from the bucket, suspending while the bucket
    /// refills.
    ///
    /// The wait is computed from the current deficit, and the clock is
    /// re-read after every sleep rather than trusting that the wait
    /// sufficed; a concurrent acquirer may have drained the refill first.
    pub async fn acquire(&self, tokens: f64) {
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                self.refill(&mut state);
                if state.tokens >= tokens {
                    state.tokens -= tokens;
                    return;
                }
                let deficit = tokens - state.tokens;
                Duration::from_secs_f64(deficit / self.refill_rate)
            };
            tracing::trace!(wait_ms = wait.as_millis() as u64, "rate limiter waiting");
            sleep(wait).await;
        }
    }

    /// Current token count, including refill accrued since the last
    /// acquisition.
    pub async fn available(&self) -> f64 {
        let state = self.state.lock().await;
        let elapsed = state.last_refill.elapsed().as_secs_f64();
        (state.tokens + elapsed * self.refill_rate).min(self.max_tokens)
    }

    fn refill(&self, state: &mut BucketState) {
        let now = Instant::now();
        let elapsed = now.duration_since(state.last_refill).as_secs_f64();
        state.tokens = (state.tokens + elapsed * self.refill_rate).min(self.max_tokens);
        state.last_refill = now;
    }
}
