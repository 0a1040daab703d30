//! Clock/timer seam.
//!
//! The engine never calls `Utc::now` or `tokio::time::sleep` directly for
//! lock deadlines; it goes through this trait so tests can run the auto-lock
//! timer under tokio's paused clock.

use std::time::Duration;

use chrono::{DateTime, Utc};

#[async_trait::async_trait]
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;

    async fn sleep(&self, duration: Duration);
}

/// Wall-clock time and tokio timers.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

#[async_trait::async_trait]
impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Clock whose "now" advances with tokio's (pausable) time source instead of
/// the wall clock. Under `#[tokio::test(start_paused = true)]` the runtime
/// auto-advances timers, and this clock's `now` moves with them, so deadline
/// comparisons behave as if real seconds had passed.
#[derive(Debug, Clone)]
pub struct PausedClock {
    base: DateTime<Utc>,
    started: tokio::time::Instant,
}

impl PausedClock {
    /// Must be created inside a tokio runtime.
    pub fn new() -> Self {
        Self {
            base: Utc::now(),
            started: tokio::time::Instant::now(),
        }
    }
}

impl Default for PausedClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Clock for PausedClock {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = self.started.elapsed();
        self.base
            + chrono::Duration::from_std(elapsed).unwrap_or_else(|_| chrono::Duration::zero())
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
