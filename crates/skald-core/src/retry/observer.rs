//! Retry event reporting
//!
//! The executor reports every state change to a [`RetryObserver`]. All
//! callbacks default to no-ops so observers implement only what they need.

use std::error::Error;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

/// Receives retry execution events
pub trait RetryObserver: Send + Sync {
    /// An attempt (1-indexed) is about to run
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        let _ = (attempt, max_attempts);
    }

    /// An attempt failed and the next one runs after `delay`
    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
        let _ = (attempt, error, delay);
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        let _ = (attempt, elapsed);
    }

    /// The final allowed attempt failed
    fn on_exhausted(&self, attempts: u32, error: &dyn Error) {
        let _ = (attempts, error);
    }

    /// The predicate refused to retry `error`
    fn on_rejected(&self, attempt: u32, error: &dyn Error) {
        let _ = (attempt, error);
    }

    /// The cancellation token fired during or after `attempt`
    fn on_cancelled(&self, attempt: u32) {
        let _ = attempt;
    }
}

/// Observer that ignores every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpObserver;

impl RetryObserver for NoOpObserver {}

/// Observer that logs through `tracing`
///
/// Attempt starts and first-try successes log at DEBUG, failed attempts,
/// rejections and cancellations at WARN, success after retry at INFO and
/// exhaustion at ERROR.
#[derive(Debug, Clone)]
pub struct TracingObserver {
    operation: String,
}

impl TracingObserver {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
        }
    }

    pub fn operation(&self) -> &str {
        &self.operation
    }
}

impl RetryObserver for TracingObserver {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        debug!(operation = %self.operation, attempt, max_attempts, "Starting attempt");
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
        warn!(
            operation = %self.operation,
            attempt,
            error = %error,
            delay_ms = delay.as_millis() as u64,
            "Attempt failed, retrying"
        );
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        let elapsed_ms = elapsed.as_millis() as u64;
        if attempt > 1 {
            info!(operation = %self.operation, attempt, elapsed_ms, "Succeeded after retry");
        } else {
            debug!(operation = %self.operation, elapsed_ms, "Succeeded on first attempt");
        }
    }

    fn on_exhausted(&self, attempts: u32, error: &dyn Error) {
        error!(operation = %self.operation, attempts, error = %error, "All attempts failed");
    }

    fn on_rejected(&self, attempt: u32, error: &dyn Error) {
        warn!(operation = %self.operation, attempt, error = %error, "Error is not retryable");
    }

    fn on_cancelled(&self, attempt: u32) {
        warn!(operation = %self.operation, attempt, "Retry cancelled");
    }
}

/// Event counts collected by a [`StatsObserver`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryStats {
    pub started: u32,
    pub failed: u32,
    pub succeeded: u32,
    pub exhausted: u32,
    pub rejected: u32,
    pub cancelled: u32,
}

/// Observer that counts events
#[derive(Debug, Default)]
pub struct StatsObserver {
    started: AtomicU32,
    failed: AtomicU32,
    succeeded: AtomicU32,
    exhausted: AtomicU32,
    rejected: AtomicU32,
    cancelled: AtomicU32,
}

impl StatsObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the counts so far
    pub fn stats(&self) -> RetryStats {
        RetryStats {
            started: self.started.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            succeeded: self.succeeded.load(Ordering::SeqCst),
            exhausted: self.exhausted.load(Ordering::SeqCst),
            rejected: self.rejected.load(Ordering::SeqCst),
            cancelled: self.cancelled.load(Ordering::SeqCst),
        }
    }

    fn bump(counter: &AtomicU32) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

impl RetryObserver for StatsObserver {
    fn on_attempt_start(&self, _attempt: u32, _max_attempts: u32) {
        Self::bump(&self.started);
    }

    fn on_attempt_failed(&self, _attempt: u32, _error: &dyn Error, _delay: Duration) {
        Self::bump(&self.failed);
    }

    fn on_success(&self, _attempt: u32, _elapsed: Duration) {
        Self::bump(&self.succeeded);
    }

    fn on_exhausted(&self, _attempts: u32, _error: &dyn Error) {
        Self::bump(&self.exhausted);
    }

    fn on_rejected(&self, _attempt: u32, _error: &dyn Error) {
        Self::bump(&self.rejected);
    }

    fn on_cancelled(&self, _attempt: u32) {
        Self::bump(&self.cancelled);
    }
}

impl<T: RetryObserver + ?Sized> RetryObserver for Arc<T> {
    fn on_attempt_start(&self, attempt: u32, max_attempts: u32) {
        (**self).on_attempt_start(attempt, max_attempts)
    }

    fn on_attempt_failed(&self, attempt: u32, error: &dyn Error, delay: Duration) {
        (**self).on_attempt_failed(attempt, error, delay)
    }

    fn on_success(&self, attempt: u32, elapsed: Duration) {
        (**self).on_success(attempt, elapsed)
    }

    fn on_exhausted(&self, attempts: u32, error: &dyn Error) {
        (**self).on_exhausted(attempts, error)
    }

    fn on_rejected(&self, attempt: u32, error: &dyn Error) {
        (**self).on_rejected(attempt, error)
    }

    fn on_cancelled(&self, attempt: u32) {
        (**self).on_cancelled(attempt)
    }
}
