//! Client-side request pacing.
//!
//! Keeps one [`Transport`](super::Transport) under a configured
//! requests-per-second ceiling so it does not provoke 429s on its own.
//! This is a local throttle: separate processes or separate limiters do not
//! coordinate.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

/// Paces requests to at most `requests_per_second`.
///
/// Requests are spaced `1 / requests_per_second` apart. A window opens when
/// a request arrives after the limiter has caught up; inside a window the
/// k-th request (0-indexed) is released at `window_start + k * interval`.
/// Issuing N requests therefore takes at least `(N - 1) / R` seconds.
///
/// The state is guarded by a [`Mutex`] that is held only while reserving a
/// slot, never across an `.await`.
///
/// # Example
///
/// ```
/// use wa_cloud::transport::RateLimiter;
///
/// # async fn example() {
/// let limiter = RateLimiter::per_second(80);
/// limiter.acquire().await;
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    requests_per_second: u32,
    interval: Duration,
    state: Mutex<RateLimitState>,
}

#[derive(Debug, Default)]
struct RateLimitState {
    window_start: Option<Instant>,
    sent_in_window: u32,
}

impl RateLimiter {
    /// Default ceiling (80 requests per second).
    pub const DEFAULT_REQUESTS_PER_SECOND: u32 = 80;

    /// Creates a limiter allowing `requests_per_second` requests per second.
    ///
    /// # Panics
    ///
    /// Panics if `requests_per_second` is zero.
    #[must_use]
    pub fn per_second(requests_per_second: u32) -> Self {
        assert!(
            requests_per_second > 0,
            "requests_per_second must be positive"
        );
        Self {
            requests_per_second,
            interval: Duration::from_secs(1) / requests_per_second,
            state: Mutex::new(RateLimitState::default()),
        }
    }

    /// Returns the configured ceiling.
    #[must_use]
    pub const fn requests_per_second(&self) -> u32 {
        self.requests_per_second
    }

    /// Returns the spacing between consecutive requests.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Waits until the next request slot opens.
    pub async fn acquire(&self) {
        let now = Instant::now();
        let slot = self.reserve(now);
        if slot > now {
            tracing::trace!("Throttling request for {:?}", slot - now);
            tokio::time::sleep_until(slot).await;
        }
    }

    /// Reserves the next slot and returns the instant it opens.
    fn reserve(&self, now: Instant) -> Instant {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

        let next_slot = state
            .window_start
            .map(|start| start + self.interval.saturating_mul(state.sent_in_window));

        match next_slot {
            Some(slot) if slot > now => {
                state.sent_in_window = state.sent_in_window.saturating_add(1);
                slot
            }
            _ => {
                state.window_start = Some(now);
                state.sent_in_window = 1;
                now
            }
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::per_second(Self::DEFAULT_REQUESTS_PER_SECOND)
    }
}
