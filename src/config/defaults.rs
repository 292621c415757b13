//! Default values for configuration options.
//!
//! Centralized constants to avoid magic numbers scattered across the codebase.

use std::time::Duration;

/// Default Graph API host.
pub const BASE_URL: &str = "https://graph.facebook.com";

/// Default Graph API version.
pub const API_VERSION: &str = "v23.0";

/// Default per-attempt timeout in seconds.
pub const TIMEOUT_SECS: f64 = 30.0;

/// Largest accepted timeout in seconds.
pub const MAX_TIMEOUT_SECS: f64 = 300.0;

/// Default number of retries after the first attempt.
pub const MAX_RETRIES: u32 = 2;

/// Largest accepted number of retries.
pub const MAX_RETRIES_LIMIT: u32 = 10;

/// Default idle connections kept per host.
pub const POOL_SIZE: usize = 100;

/// Default TLS certificate verification.
pub const VERIFY_TLS: bool = true;

/// Default client-side requests-per-second ceiling.
pub const RATE_LIMIT: u32 = 80;

/// Largest accepted requests-per-second ceiling.
pub const MAX_RATE_LIMIT: u32 = 1000;

/// Default initial retry delay in milliseconds.
pub const RETRY_INITIAL_DELAY_MS: u64 = 1000;

/// Default maximum retry delay in milliseconds.
pub const RETRY_MAX_DELAY_MS: u64 = 30_000;

/// Default retry backoff multiplier.
pub const RETRY_MULTIPLIER: f64 = 2.0;

/// Default retry jitter fraction (disabled).
pub const RETRY_JITTER: f64 = 0.0;

/// File written by `init` when no path is given.
pub const CONFIG_FILE: &str = "wa-cloud.toml";

/// Default per-attempt timeout as Duration.
#[must_use]
pub const fn timeout() -> Duration {
    Duration::from_secs(30)
}

/// Default initial retry delay as Duration.
#[must_use]
pub const fn retry_initial_delay() -> Duration {
    Duration::from_millis(RETRY_INITIAL_DELAY_MS)
}

/// Default maximum retry delay as Duration.
#[must_use]
pub const fn retry_max_delay() -> Duration {
    Duration::from_millis(RETRY_MAX_DELAY_MS)
}
