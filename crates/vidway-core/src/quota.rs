//! Quota ledger.
//!
//! Tracks consumption of a finite, periodically-renewing budget of abstract
//! units. The window rolls lazily: the first reservation attempt after the
//! window elapses resets `consumed` and advances the window start.

use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;

use crate::error::{GatewayError, Result};

/// A point-in-time view of the ledger.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaSnapshot {
    pub capacity: u64,
    pub consumed: u64,
    pub remaining: u64,
    /// Time until the current window resets.
    pub reset_in: Duration,
}

struct WindowState {
    consumed: u64,
    window_start: Instant,
}

/// Tracks a periodically-renewing unit budget.
///
/// `consumed <= capacity` holds after every successful reservation. All
/// mutation happens under one mutex; reservations are atomic
/// check-then-increment with no side effects on failure.
pub struct QuotaLedger {
    capacity: u64,
    window: Duration,
    state: Mutex<WindowState>,
}

impl QuotaLedger {
    pub fn new(capacity: u64, window: Duration) -> Self {
        Self {
            capacity,
            window,
            state: Mutex::new(WindowState {
                consumed: 0,
                window_start: Instant::now(),
            }),
        }
    }

    /// Reserves `cost` units from the current window.
    ///
    /// Rolls the window first if it has elapsed. On success the units are
    /// debited immediately; they are never refunded, even if the call the
    /// reservation was made for later fails.
    pub fn reserve(&self, cost: u64) -> Result<()> {
        let mut state = self.state.lock().expect("quota ledger lock poisoned");
        let now = Instant::now();
        self.roll_window(&mut state, now);

        if state.consumed + cost <= self.capacity {
            state.consumed += cost;
            tracing::debug!(
                cost,
                consumed = state.consumed,
                capacity = self.capacity,
                "quota reserved"
            );
            Ok(())
        } else {
            let remaining = self.capacity - state.consumed;
            let reset_in = self.window.saturating_sub(now - state.window_start);
            tracing::warn!(cost, remaining, "quota reservation rejected");
            Err(GatewayError::QuotaExceeded {
                remaining,
                reset_in_secs: reset_in.as_secs(),
            })
        }
    }

    /// Returns the current ledger state, rolling the window if elapsed.
    pub fn snapshot(&self) -> QuotaSnapshot {
        let mut state = self.state.lock().expect("quota ledger lock poisoned");
        let now = Instant::now();
        self.roll_window(&mut state, now);
        QuotaSnapshot {
            capacity: self.capacity,
            consumed: state.consumed,
            remaining: self.capacity - state.consumed,
            reset_in: self.window.saturating_sub(now - state.window_start),
        }
    }

    fn roll_window(&self, state: &mut WindowState, now: Instant) {
        if now.duration_since(state.window_start) >= self.window {
            // Advance to the start of the current window, not just by one
            // period, so a long-idle ledger lands in the right window.
            let elapsed = now.duration_since(state.window_start);
            let periods = elapsed.as_nanos() / self.window.as_nanos().max(1);
            state.window_start += self.window.saturating_mul(periods as u32);
            state.consumed = 0;
            tracing::debug!("quota window rolled");
        }
    }
}
