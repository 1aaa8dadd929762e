//! Minimum-interval gate shared by every request of a run
//!
//! The gate remembers when the previous request *finished* and, before the
//! next one starts, sleeps for whatever is left of the configured interval.
//! Time comes from a [`Clock`] so tests can run the gate on virtual time.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Source of time for the rate limiter
#[async_trait]
pub trait Clock: Send + Sync {
    /// Current instant
    fn now(&self) -> Instant;

    /// Suspends the caller for `duration`
    async fn sleep(&self, duration: Duration);
}

#[async_trait]
impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Instant {
        (**self).now()
    }

    async fn sleep(&self, duration: Duration) {
        (**self).sleep(duration).await
    }
}

/// Wall clock backed by tokio's timer
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Virtual clock that only moves when slept on or advanced by hand
///
/// Sleeping returns immediately and pushes virtual time forward, so a run
/// with a one-second interval finishes instantly while still observing the
/// same timeline a real run would.
#[derive(Debug)]
pub struct ManualClock {
    origin: Instant,
    elapsed: Mutex<Duration>,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            elapsed: Mutex::new(Duration::ZERO),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    /// Moves virtual time forward without recording a sleep
    pub fn advance(&self, duration: Duration) {
        let mut elapsed = self.elapsed.lock().unwrap_or_else(PoisonError::into_inner);
        *elapsed += duration;
    }

    /// Virtual time elapsed since the clock was created
    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.origin + self.elapsed()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(duration);
        self.advance(duration);
    }
}

/// Enforces a minimum gap between the end of one request and the start of the next
#[derive(Debug)]
pub struct MinIntervalGate<C> {
    clock: C,
    min_interval: Duration,
    last_finished: Option<Instant>,
}

impl<C: Clock> MinIntervalGate<C> {
    pub fn new(clock: C, min_interval: Duration) -> Self {
        Self {
            clock,
            min_interval,
            last_finished: None,
        }
    }

    /// Waits until the interval since the last finished request has elapsed
    ///
    /// Returns the time actually slept. The first request of a run never
    /// waits.
    pub async fn wait_turn(&mut self) -> Duration {
        let Some(last) = self.last_finished else {
            return Duration::ZERO;
        };

        let since = self.clock.now().saturating_duration_since(last);
        if since >= self.min_interval {
            return Duration::ZERO;
        }

        let wait = self.min_interval - since;
        tracing::trace!("Rate limit: waiting {:?} before next request", wait);
        self.clock.sleep(wait).await;
        wait
    }

    /// Records that the current request has finished
    pub fn mark_finished(&mut self) {
        self.last_finished = Some(self.clock.now());
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }
}
