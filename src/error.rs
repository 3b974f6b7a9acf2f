/// Configuration rejected at construction.
///
/// Returned by the `TryFrom` constructors of the validated option newtypes
/// ([`Capacity`](crate::Capacity), [`WindowDuration`](crate::WindowDuration),
/// [`RefillRate`](crate::RefillRate), ...). Invalid values are never silently
/// defaulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Capacity must admit at least one permit.
    #[error("capacity must be at least 1")]
    ZeroCapacity,
    /// The sliding window must span a positive duration.
    #[error("window duration must be greater than zero")]
    ZeroWindow,
    /// Token bucket refill rate must be a positive, finite number.
    #[error("refill rate must be a positive, finite number")]
    InvalidRefillRate,
    /// Idle eviction timeout must be a positive duration.
    #[error("idle timeout must be greater than zero")]
    ZeroIdleTimeout,
    /// The scheduler must be permitted at least one attempt.
    #[error("max attempts must be at least 1")]
    ZeroMaxAttempts,
    /// The delay before the first retry must be positive.
    #[error("base delay must be greater than zero")]
    ZeroBaseDelay,
    /// Backoff must not shrink delays between attempts.
    #[error("backoff factor must be a finite number >= 1.0")]
    InvalidBackoffFactor,
}

/// Terminal outcome of a failed [`RetryScheduler::execute`](crate::RetryScheduler::execute) call.
///
/// Each variant is distinct so callers can differentiate "not worth retrying"
/// from "gave up" from "ran out of time" from "we stopped it".
#[derive(Debug, thiserror::Error)]
pub enum RetryError<E> {
    /// The operation failed with an error classified as not worth retrying.
    ///
    /// The original error value is carried unchanged.
    #[error("non-retryable error: {0}")]
    NonRetryable(E),
    /// Every permitted attempt failed with a retryable error.
    #[error("retries exhausted after {attempts} attempts")]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Errors from every attempt, oldest first.
        errors: Vec<E>,
    },
    /// The overall deadline elapsed before the operation succeeded.
    #[error("deadline exceeded after {attempts} attempts")]
    DeadlineExceeded {
        /// Attempts completed before the deadline cut execution short.
        attempts: u32,
    },
    /// External cancellation was observed before completion.
    #[error("cancelled before completion")]
    Cancelled,
}

impl<E> RetryError<E> {
    /// The underlying operation error, when this outcome carries exactly one.
    pub fn into_inner(self) -> Option<E> {
        match self {
            Self::NonRetryable(e) => Some(e),
            Self::Exhausted { mut errors, .. } => errors.pop(),
            Self::DeadlineExceeded { .. } | Self::Cancelled => None,
        }
    }

    /// True when execution was stopped by an external cancellation signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
