//! Terminal outcomes of a failed retry execution

use std::time::Duration;

use thiserror::Error;

/// Why a retry execution gave up
///
/// Generic over `E`, the error type of the operation being retried.
#[derive(Error, Debug)]
pub enum RetryError<E> {
    /// Every allowed attempt failed; `source` is the last failure
    #[error("retry exhausted after {attempts} attempts over {secs:.2}s: {source}", secs = .total_duration.as_secs_f64())]
    Exhausted {
        attempts: u32,
        source: E,
        total_duration: Duration,
    },

    /// The cancellation token fired before an attempt succeeded
    #[error("retry cancelled after {attempts} attempts")]
    Cancelled {
        /// Attempts started before cancellation
        attempts: u32,
        #[source]
        last_error: Option<E>,
    },

    /// The predicate rejected the error, no further attempts were made
    #[error("non-retryable error: {0}")]
    NonRetryable(#[source] E),
}

impl<E> RetryError<E> {
    /// Attempts started before the execution ended
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Exhausted { attempts, .. } | Self::Cancelled { attempts, .. } => *attempts,
            Self::NonRetryable(_) => 1,
        }
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    pub fn is_non_retryable(&self) -> bool {
        matches!(self, Self::NonRetryable(_))
    }

    /// The operation's own error, if one was recorded
    pub fn into_source(self) -> Option<E> {
        match self {
            Self::Exhausted { source, .. } | Self::NonRetryable(source) => Some(source),
            Self::Cancelled { last_error, .. } => last_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;
    use std::io;

    fn refused() -> io::Error {
        io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused")
    }

    #[test]
    fn test_exhausted_reports_attempts_and_duration() {
        let err = RetryError::Exhausted {
            attempts: 4,
            source: refused(),
            total_duration: Duration::from_millis(3000),
        };

        assert!(err.is_exhausted());
        assert_eq!(err.attempts(), 4);
        assert_eq!(
            err.to_string(),
            "retry exhausted after 4 attempts over 3.00s: connection refused"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_cancelled_without_error_has_no_source() {
        let err: RetryError<io::Error> = RetryError::Cancelled {
            attempts: 0,
            last_error: None,
        };

        assert!(err.is_cancelled());
        assert!(err.source().is_none());
        assert!(err.into_source().is_none());
    }

    #[test]
    fn test_cancelled_keeps_last_error() {
        let err = RetryError::Cancelled {
            attempts: 2,
            last_error: Some(refused()),
        };

        assert_eq!(err.to_string(), "retry cancelled after 2 attempts");
        assert_eq!(
            err.into_source().map(|e| e.kind()),
            Some(io::ErrorKind::ConnectionRefused)
        );
    }

    #[test]
    fn test_non_retryable_counts_one_attempt() {
        let err = RetryError::NonRetryable(io::Error::new(io::ErrorKind::NotFound, "not found"));

        assert!(err.is_non_retryable());
        assert_eq!(err.attempts(), 1);
        assert_eq!(err.to_string(), "non-retryable error: not found");
    }
}
