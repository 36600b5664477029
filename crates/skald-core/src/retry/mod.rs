//! Retry execution engine with policy-based configuration
//!
//! Every fallible network call in Skald goes through this engine instead of
//! hand-rolled loops. An execution moves through the states
//! Attempting → Backoff → Attempting … and ends in Succeeded or Failed
//! (exhausted, non-retryable or cancelled). The attempt ceiling comes from
//! the [`RetryPolicy`](crate::types::RetryPolicy).
//!
//! # Features
//!
//! - Retry strategies: None, Fixed, Exponential, Linear backoff
//! - Optional jitter
//! - Predicates deciding which errors are worth another attempt
//! - Observable retry attempts via the `RetryObserver` trait
//! - Cooperative cancellation of in-flight attempts and pending backoffs
//!
//! # Example
//!
//! ```rust,no_run
//! use skald_core::retry::{RetryError, RetryExecutor, TracingObserver};
//! use skald_core::types::RetryPolicy;
//!
//! async fn example() -> Result<String, RetryError<std::io::Error>> {
//!     RetryExecutor::new(RetryPolicy::metadata_fetch())
//!         .with_observer(TracingObserver::new("metadata"))
//!         .execute(|| async { Ok("success".to_string()) })
//!         .await
//! }
//! ```

mod error;
mod executor;
mod observer;
mod strategies;

pub use error::RetryError;
pub use executor::RetryExecutor;
pub use observer::{NoOpObserver, RetryObserver, RetryStats, StatsObserver, TracingObserver};
pub use strategies::{calculate_delay, AlwaysRetry, ClosurePredicate, RetryPredicate};
