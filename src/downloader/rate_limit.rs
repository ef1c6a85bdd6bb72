//! Rate limiting shared by all category workers
//!
//! Caps dispatched queries at `max_requests` per rolling window. The limiter
//! keeps the instants of the last `max_requests` dispatches; an acquire that
//! would exceed the cap sleeps until the oldest of them leaves the window.

use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};
use tracing::debug;

use crate::downloader::config::{DEFAULT_RATE_LIMIT, RATE_LIMIT_WINDOW};

/// Request-based rate limiter
///
/// `acquire` is an exclusive gate: the check-and-record sequence, including any
/// wait, runs under one lock. No ordering guarantee beyond the scheduler's.
#[derive(Debug)]
pub struct RateLimiter {
    max_requests: usize,
    window: Duration,
    dispatched: Mutex<VecDeque<Instant>>,
}

impl RateLimiter {
    /// Create a limiter allowing `max_requests` per `window`
    ///
    /// A limit of 0 is treated as 1.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        let max_requests = (max_requests as usize).max(1);
        Self {
            max_requests,
            window,
            dispatched: Mutex::new(VecDeque::with_capacity(max_requests)),
        }
    }

    /// Create a limiter allowing `max_requests` per second
    pub fn per_second(max_requests: u32) -> Self {
        Self::new(max_requests, RATE_LIMIT_WINDOW)
    }

    /// Maximum requests per window
    pub fn max_requests(&self) -> usize {
        self.max_requests
    }

    /// Window length
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Wait until one more query may be dispatched, then record it
    ///
    /// # Returns
    /// How long the caller was suspended
    pub async fn acquire(&self) -> Duration {
        let mut dispatched = self.dispatched.lock().await;
        let mut waited = Duration::ZERO;

        loop {
            let now = Instant::now();
            while let Some(&oldest) = dispatched.front() {
                if now.duration_since(oldest) >= self.window {
                    dispatched.pop_front();
                } else {
                    break;
                }
            }

            if dispatched.len() < self.max_requests {
                dispatched.push_back(now);
                if !waited.is_zero() {
                    crate::metrics::record_rate_limit_wait(waited);
                }
                return waited;
            }

            let Some(&oldest) = dispatched.front() else {
                continue;
            };
            let wait = (oldest + self.window).saturating_duration_since(now);
            debug!(
                wait_ms = wait.as_millis() as u64,
                limit = self.max_requests,
                "Rate limit hit - sleeping"
            );
            sleep(wait).await;
            waited += wait;
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::per_second(DEFAULT_RATE_LIMIT)
    }
}
