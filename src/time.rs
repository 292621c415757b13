//! Time abstraction for testability.
//!
//! This module provides a [`Sleeper`] trait that allows injecting instant
//! or recording sleepers in tests while using the tokio timer in production.

use std::future::Future;
use std::time::Duration;

/// Abstraction over waiting between retry attempts.
///
/// Implementations decide how a backoff delay is spent, allowing tests to
/// skip real waiting and inspect the requested delays instead.
///
/// # Example
///
/// ```
/// use wa_cloud::time::{InstantSleeper, Sleeper};
/// use std::time::Duration;
///
/// # async fn example() {
/// InstantSleeper.sleep(Duration::from_secs(60)).await; // returns immediately
/// # }
/// ```
pub trait Sleeper: Send + Sync {
    /// Waits for the given duration.
    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send;
}

/// Production sleeper backed by [`tokio::time::sleep`].
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeper that returns immediately.
///
/// Zero-cost stand-in for tests that exercise retry paths without waiting.
#[derive(Debug, Clone, Copy, Default)]
pub struct InstantSleeper;

impl Sleeper for InstantSleeper {
    async fn sleep(&self, _duration: Duration) {}
}
