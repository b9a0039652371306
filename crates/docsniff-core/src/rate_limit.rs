//! Outbound request throttling.
//!
//! One limiter is shared by every classification run in an engine. Callers
//! take a slot before any network activity; when the window budget is
//! spent, acquisition sleeps until the window resets instead of failing.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;

#[derive(Debug)]
struct WindowState {
    count: u32,
    window_started_at: Instant,
}

/// Request limiter over a fixed one-minute window.
///
/// Cloning shares the window state, so an engine and its clones draw from
/// the same budget.
#[derive(Clone)]
pub struct RateLimiter {
    max_per_window: u32,
    window: Duration,
    state: Arc<Mutex<WindowState>>,
}

impl RateLimiter {
    /// Limiter with the standard one-minute window. A budget of zero
    /// means unlimited.
    pub fn new(max_per_minute: u32) -> Self {
        Self::with_window(max_per_minute, Duration::from_secs(60))
    }

    /// Limiter with a custom window length. Short windows keep tests fast.
    pub fn with_window(max_per_window: u32, window: Duration) -> Self {
        Self {
            max_per_window,
            window,
            state: Arc::new(Mutex::new(WindowState {
                count: 0,
                window_started_at: Instant::now(),
            })),
        }
    }

    /// Take one slot from the current window, sleeping out the remainder
    /// when the budget is spent. Never fails.
    pub async fn acquire(&self) {
        if self.max_per_window == 0 {
            return;
        }
        loop {
            let wait = {
                let mut state = self.state.lock().await;
                if state.window_started_at.elapsed() >= self.window {
                    state.count = 0;
                    state.window_started_at = Instant::now();
                }
                if state.count < self.max_per_window {
                    state.count += 1;
                    return;
                }
                self.window
                    .saturating_sub(state.window_started_at.elapsed())
            };
            // Lock released while sleeping; waiters re-check on wakeup.
            tracing::debug!(
                wait_ms = %wait.as_millis(),
                "rate limit reached, waiting for window reset"
            );
            tokio::time::sleep(wait).await;
        }
    }
}
