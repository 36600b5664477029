//! Retry execution engine
//!
//! This module provides the core retry execution logic with configurable
//! policies, predicates, observers and cancellation.

use std::error::Error;
use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::types::RetryPolicy;

use super::error::RetryError;
use super::observer::{NoOpObserver, RetryObserver};
use super::strategies::{calculate_delay, AlwaysRetry, RetryPredicate};

/// A retry executor with configurable policy, predicate, observer and
/// cancellation token
///
/// Delays between attempts suspend the calling task with `tokio::time::sleep`;
/// other tasks keep running.
pub struct RetryExecutor<E, P = AlwaysRetry, O = NoOpObserver> {
    policy: RetryPolicy,
    predicate: P,
    observer: O,
    jitter: bool,
    cancellation: Option<CancellationToken>,
    _phantom: PhantomData<fn() -> E>,
}

impl<E> RetryExecutor<E, AlwaysRetry, NoOpObserver> {
    /// Create a new retry executor that retries every error
    ///
    /// Jitter is enabled by default.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            predicate: AlwaysRetry,
            observer: NoOpObserver,
            jitter: true,
            cancellation: None,
            _phantom: PhantomData,
        }
    }
}

impl<E, P, O> RetryExecutor<E, P, O> {
    /// Set the retry predicate
    pub fn with_predicate<P2>(self, predicate: P2) -> RetryExecutor<E, P2, O> {
        RetryExecutor {
            policy: self.policy,
            predicate,
            observer: self.observer,
            jitter: self.jitter,
            cancellation: self.cancellation,
            _phantom: PhantomData,
        }
    }

    /// Set the observer
    pub fn with_observer<O2>(self, observer: O2) -> RetryExecutor<E, P, O2> {
        RetryExecutor {
            policy: self.policy,
            predicate: self.predicate,
            observer,
            jitter: self.jitter,
            cancellation: self.cancellation,
            _phantom: PhantomData,
        }
    }

    /// Enable or disable jitter
    pub fn with_jitter(mut self, jitter: bool) -> Self {
        self.jitter = jitter;
        self
    }

    /// Abort in-flight attempts and pending delays when `token` is cancelled
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    /// The policy this executor runs with
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }
}

impl<E, P, O> RetryExecutor<E, P, O>
where
    E: fmt::Display + Send + 'static,
    P: RetryPredicate<E>,
    O: RetryObserver,
{
    /// Execute an operation with retry logic
    ///
    /// At least one attempt is always made.
    pub async fn execute<F, Fut, T>(&self, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let start = Instant::now();
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last_error: Option<E> = None;

        for attempt in 1..=max_attempts {
            if self.is_cancelled() {
                self.observer.on_cancelled(attempt - 1);
                return Err(RetryError::Cancelled {
                    attempts: attempt - 1,
                    last_error,
                });
            }

            self.observer.on_attempt_start(attempt, max_attempts);

            let outcome = match &self.cancellation {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            self.observer.on_cancelled(attempt);
                            return Err(RetryError::Cancelled { attempts: attempt, last_error });
                        }
                        outcome = op() => outcome,
                    }
                }
                None => op().await,
            };

            let err = match outcome {
                Ok(result) => {
                    self.observer.on_success(attempt, start.elapsed());
                    return Ok(result);
                }
                Err(err) => err,
            };

            if !self.predicate.should_retry(&err) {
                let display_err = DisplayError(err.to_string());
                self.observer.on_rejected(attempt, &display_err);
                return Err(RetryError::NonRetryable(err));
            }

            if attempt >= max_attempts {
                let display_err = DisplayError(err.to_string());
                self.observer.on_exhausted(attempt, &display_err);
                return Err(RetryError::Exhausted {
                    attempts: attempt,
                    source: err,
                    total_duration: start.elapsed(),
                });
            }

            let delay = calculate_delay(&self.policy, attempt, self.jitter);

            let display_err = DisplayError(err.to_string());
            self.observer
                .on_attempt_failed(attempt, &display_err, delay);

            last_error = Some(err);

            if delay.is_zero() {
                continue;
            }

            match &self.cancellation {
                Some(token) => {
                    tokio::select! {
                        biased;
                        _ = token.cancelled() => {
                            self.observer.on_cancelled(attempt);
                            return Err(RetryError::Cancelled { attempts: attempt, last_error });
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
                None => tokio::time::sleep(delay).await,
            }
        }

        // Unreachable with max_attempts >= 1
        Err(RetryError::Cancelled {
            attempts: max_attempts,
            last_error,
        })
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}

/// A simple wrapper to convert Display types to Error for observer callbacks
#[derive(Debug)]
struct DisplayError(String);

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Error for DisplayError {}
