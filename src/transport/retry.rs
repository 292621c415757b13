//! Retry policy configuration for transport calls.

use std::time::Duration;

use rand::Rng;

/// Configuration for exponential backoff retry behavior.
///
/// Controls how many times a call is attempted, which statuses count as
/// transient, and how long to wait between attempts. Delays grow by
/// `multiplier` per retry and are capped at `max_delay`.
///
/// # Defaults
///
/// - `max_attempts`: 3
/// - `initial_delay`: 1 second
/// - `max_delay`: 30 seconds
/// - `multiplier`: 2.0
/// - `retryable_statuses`: 408, 429, 500, 502, 503, 504
/// - `jitter`: 0.0 (exact exponential spacing)
///
/// # Example
///
/// ```
/// use wa_cloud::transport::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::new()
///     .with_max_attempts(5)
///     .with_initial_delay(Duration::from_millis(500))
///     .with_max_delay(Duration::from_secs(10))
///     .with_multiplier(1.5)
///     .with_jitter(0.2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (including the initial attempt).
    ///
    /// A value of 1 means no retries; only the initial attempt is made.
    pub max_attempts: u32,

    /// Delay before the first retry.
    pub initial_delay: Duration,

    /// Upper bound for any single delay.
    pub max_delay: Duration,

    /// Multiplier applied to the delay after each retry.
    pub multiplier: f64,

    /// Response statuses treated as transient.
    pub retryable_statuses: Vec<http::StatusCode>,

    /// Fraction of each delay that may be randomly shaved off, in `[0.0, 1.0)`.
    pub jitter: f64,
}

impl RetryPolicy {
    /// Default maximum attempts.
    pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

    /// Default initial delay (1 second).
    pub const DEFAULT_INITIAL_DELAY: Duration = Duration::from_secs(1);

    /// Default maximum delay (30 seconds).
    pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

    /// Default multiplier (2.0).
    pub const DEFAULT_MULTIPLIER: f64 = 2.0;

    /// Default jitter (disabled).
    pub const DEFAULT_JITTER: f64 = 0.0;

    /// Default retryable statuses.
    pub const DEFAULT_RETRYABLE_STATUSES: [http::StatusCode; 6] = [
        http::StatusCode::REQUEST_TIMEOUT,
        http::StatusCode::TOO_MANY_REQUESTS,
        http::StatusCode::INTERNAL_SERVER_ERROR,
        http::StatusCode::BAD_GATEWAY,
        http::StatusCode::SERVICE_UNAVAILABLE,
        http::StatusCode::GATEWAY_TIMEOUT,
    ];

    /// Minimum value for `max_attempts`.
    pub const MIN_MAX_ATTEMPTS: u32 = 1;

    /// Creates a new retry policy with default values.
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_attempts: Self::DEFAULT_MAX_ATTEMPTS,
            initial_delay: Self::DEFAULT_INITIAL_DELAY,
            max_delay: Self::DEFAULT_MAX_DELAY,
            multiplier: Self::DEFAULT_MULTIPLIER,
            retryable_statuses: Self::DEFAULT_RETRYABLE_STATUSES.to_vec(),
            jitter: Self::DEFAULT_JITTER,
        }
    }

    /// Sets the maximum number of attempts.
    ///
    /// # Panics
    ///
    /// Panics if `max_attempts` is less than 1.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        assert!(
            max_attempts >= Self::MIN_MAX_ATTEMPTS,
            "max_attempts must be at least 1"
        );
        self.max_attempts = max_attempts;
        self
    }

    /// Sets the initial delay between retries.
    ///
    /// Zero delay is supported (useful for testing with [`InstantSleeper`])
    /// but not recommended for production as it creates a tight retry loop.
    ///
    /// [`InstantSleeper`]: crate::time::InstantSleeper
    #[must_use]
    pub const fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay between retries.
    #[must_use]
    pub const fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the delay multiplier.
    ///
    /// # Panics
    ///
    /// Panics if `multiplier` is not positive (must be > 0.0).
    #[must_use]
    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        assert!(multiplier > 0.0, "multiplier must be positive");
        self.multiplier = multiplier;
        self
    }

    /// Replaces the set of retryable statuses.
    #[must_use]
    pub fn with_retryable_statuses(
        mut self,
        statuses: impl IntoIterator<Item = http::StatusCode>,
    ) -> Self {
        self.retryable_statuses = statuses.into_iter().collect();
        self
    }

    /// Sets the jitter fraction.
    ///
    /// # Panics
    ///
    /// Panics if `jitter` is outside `[0.0, 1.0)`.
    #[must_use]
    pub fn with_jitter(mut self, jitter: f64) -> Self {
        assert!(
            (0.0..1.0).contains(&jitter),
            "jitter must be in [0.0, 1.0)"
        );
        self.jitter = jitter;
        self
    }

    /// Computes the delay for a given retry number (0-indexed).
    ///
    /// # Arguments
    ///
    /// * `retry` - The retry number (0 = delay before first retry, 1 = delay before second retry, etc.)
    ///
    /// # Returns
    ///
    /// `initial_delay * multiplier^retry`, capped at `max_delay`. No jitter.
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        // Safe cast: retry values are small (bounded by max_attempts)
        #[allow(clippy::cast_possible_wrap)]
        let multiplier = self.multiplier.powi(retry as i32);
        let delay_secs = self.initial_delay.as_secs_f64() * multiplier;
        let capped = delay_secs.min(self.max_delay.as_secs_f64());
        Duration::from_secs_f64(capped)
    }

    /// Applies jitter to a computed delay.
    ///
    /// Returns a value in `(delay * (1 - jitter), delay]`. With zero jitter
    /// the delay is returned unchanged.
    #[must_use]
    pub fn jittered(&self, delay: Duration) -> Duration {
        if self.jitter <= 0.0 || delay.is_zero() {
            return delay;
        }
        let shave = rand::thread_rng().gen_range(0.0..self.jitter);
        delay.mul_f64(1.0 - shave)
    }

    /// Returns true if another attempt may follow the given one.
    ///
    /// # Arguments
    ///
    /// * `attempt` - The attempt number (1 = first attempt, 2 = first retry, etc.)
    #[must_use]
    pub const fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Returns true if a response with this status should be retried.
    #[must_use]
    pub fn is_retryable_status(&self, status: http::StatusCode) -> bool {
        self.retryable_statuses.contains(&status)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}
