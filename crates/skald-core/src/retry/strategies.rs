//! Backoff delays and retry predicates

use std::time::Duration;

use rand::Rng;

use crate::types::{RetryPolicy, RetryStrategy};

/// Delay to wait after `failed_attempt` (1-indexed) before the next one
///
/// Linear backoff waits `initial_delay_ms * (failed_attempt - 1)`, so the
/// first retry runs immediately. Every strategy is capped at
/// `max_delay_ms`; jitter adds up to 25% on top of a non-zero delay.
///
/// ```rust
/// use skald_core::retry::calculate_delay;
/// use skald_core::types::RetryPolicy;
///
/// let policy = RetryPolicy::metadata_fetch();
///
/// assert_eq!(calculate_delay(&policy, 1, false).as_millis(), 0);
/// assert_eq!(calculate_delay(&policy, 2, false).as_millis(), 1000);
/// assert_eq!(calculate_delay(&policy, 3, false).as_millis(), 2000);
/// ```
pub fn calculate_delay(policy: &RetryPolicy, failed_attempt: u32, jitter: bool) -> Duration {
    let delay_ms = base_delay_ms(policy, failed_attempt.saturating_sub(1)).min(policy.max_delay_ms);

    if jitter && delay_ms > 0 {
        let extra = rand::rng().random_range(0..=delay_ms / 4);
        Duration::from_millis(delay_ms + extra)
    } else {
        Duration::from_millis(delay_ms)
    }
}

fn base_delay_ms(policy: &RetryPolicy, step: u32) -> u64 {
    let initial = policy.initial_delay_ms;
    match policy.strategy {
        RetryStrategy::None => 0,
        RetryStrategy::FixedDelay => initial,
        RetryStrategy::LinearBackoff => initial.saturating_mul(u64::from(step)),
        RetryStrategy::ExponentialBackoff => {
            (initial as f64 * policy.backoff_multiplier.powi(step as i32)) as u64
        }
    }
}

/// Decides whether a failed attempt is worth repeating
///
/// A rejected error ends the execution with
/// [`RetryError::NonRetryable`](super::RetryError::NonRetryable).
pub trait RetryPredicate<E: ?Sized>: Send + Sync {
    fn should_retry(&self, error: &E) -> bool;
}

/// Retries every error
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetry;

impl<E: ?Sized> RetryPredicate<E> for AlwaysRetry {
    fn should_retry(&self, _error: &E) -> bool {
        true
    }
}

/// Predicate backed by a closure
pub struct ClosurePredicate<F> {
    predicate: F,
}

impl<F> ClosurePredicate<F> {
    pub fn new(predicate: F) -> Self {
        Self { predicate }
    }
}

impl<E, F> RetryPredicate<E> for ClosurePredicate<F>
where
    F: Fn(&E) -> bool + Send + Sync,
{
    fn should_retry(&self, error: &E) -> bool {
        (self.predicate)(error)
    }
}
