//! Resilient execution of fallible async operations.
//!
//! [`RetryScheduler`] is a pure control-flow wrapper: it takes the operation
//! as an explicit value, owns the retry loop, and returns either the success
//! value or a terminal [`RetryError`](crate::RetryError). It holds no shared
//! mutable state, so every `execute` call is fully independent and no
//! cross-invocation locking exists.

mod backoff;
pub use backoff::JitterMode;
pub(crate) use backoff::nominal_delay;

mod sleeper;
pub use sleeper::{Sleeper, TokioSleeper};

use std::{
    future::Future,
    sync::Arc,
    time::{Duration, Instant},
};

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{BackoffFactor, BaseDelay, MaxAttempts, RetryError};

/// Configuration for [`RetryScheduler`].
#[derive(Clone, Copy, Debug)]
pub struct RetryOptions {
    /// Attempt bound, first attempt included.
    pub max_attempts: MaxAttempts,
    /// Nominal delay before the first retry.
    pub base_delay: BaseDelay,
    /// Growth factor for the nominal delay after each failure.
    pub backoff_factor: BackoffFactor,
    /// Cap on the nominal delay.
    pub max_delay: Duration,
    /// Randomization applied to nominal delays.
    pub jitter: JitterMode,
    /// Optional overall deadline measured from the start of `execute`.
    ///
    /// When both this and `max_attempts` are set, whichever triggers first
    /// wins. A wait that would overshoot the deadline is not started.
    pub deadline: Option<Duration>,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            max_attempts: MaxAttempts::default(),
            base_delay: BaseDelay::default(),
            backoff_factor: BackoffFactor::default(),
            max_delay: Duration::from_secs(10),
            jitter: JitterMode::default(),
            deadline: None,
        }
    }
}

/// Errors that carry their own retryability tag.
///
/// Implementing this lets [`RetryScheduler::for_retryable`] branch on a
/// first-class error attribute instead of string matching.
pub trait Retryable {
    /// Whether another attempt could plausibly succeed.
    fn is_retryable(&self) -> bool;
}

/// Snapshot of one failed attempt, handed to the retry observer hook.
///
/// Exists only for the duration of the hook call; nothing is persisted.
#[derive(Debug)]
pub struct AttemptRecord<'a, E> {
    /// 1-based index of the attempt that just failed.
    pub attempt: u32,
    /// The error that attempt produced.
    pub error: &'a E,
    /// Wait before the next attempt, jitter already applied.
    pub delay: Duration,
}

type Classifier<E> = Arc<dyn Fn(&E) -> bool + Send + Sync>;
type RetryHook<E> = Arc<dyn Fn(&AttemptRecord<'_, E>) + Send + Sync>;

/// Executes a fallible async operation with bounded, backed-off retries.
///
/// The scheduler never logs errors and never retries on its own authority
/// beyond what [`RetryOptions`] and the classifier permit: a non-retryable
/// error propagates immediately and unchanged, exhaustion wraps the full
/// ordered error history, and cancellation or the deadline stop further
/// attempts without starting new work.
pub struct RetryScheduler<E> {
    options: RetryOptions,
    classify: Classifier<E>,
    on_retry: Option<RetryHook<E>>,
    sleeper: Arc<dyn Sleeper>,
}

impl<E> std::fmt::Debug for RetryScheduler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryScheduler")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<E> RetryScheduler<E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    /// Scheduler treating every error as retryable.
    pub fn new(options: RetryOptions) -> Self {
        Self {
            options,
            classify: Arc::new(|_| true),
            on_retry: None,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// Scheduler consulting the error's own [`Retryable`] tag.
    pub fn for_retryable(options: RetryOptions) -> Self
    where
        E: Retryable,
    {
        Self::new(options).with_classifier(|error: &E| error.is_retryable())
    }

    /// Replace the retryability predicate.
    pub fn with_classifier<F>(mut self, classify: F) -> Self
    where
        F: Fn(&E) -> bool + Send + Sync + 'static,
    {
        self.classify = Arc::new(classify);
        self
    }

    /// Observe each failed attempt before the scheduler waits to retry it.
    pub fn on_retry<F>(mut self, hook: F) -> Self
    where
        F: Fn(&AttemptRecord<'_, E>) + Send + Sync + 'static,
    {
        self.on_retry = Some(Arc::new(hook));
        self
    }

    /// Replace the wait implementation (primarily for tests).
    pub fn with_sleeper<S>(mut self, sleeper: S) -> Self
    where
        S: Sleeper + 'static,
    {
        self.sleeper = Arc::new(sleeper);
        self
    }

    /// Run `operation` until it succeeds or a terminal outcome is reached.
    ///
    /// The operation runs at least once. See [`RetryError`](crate::RetryError)
    /// for the terminal outcomes.
    pub async fn execute<T, F, Fut>(&self, operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let token = CancellationToken::new();
        self.execute_with_cancellation(&token, operation).await
    }

    /// Like [`execute`](Self::execute), but observing an external cancel signal.
    ///
    /// Cancellation observed before an attempt starts returns
    /// [`RetryError::Cancelled`] without starting it; cancellation during a
    /// wait aborts the wait the same way. An attempt already in flight is not
    /// preempted (the scheduler does not own the operation's future beyond
    /// awaiting it).
    pub async fn execute_with_cancellation<T, F, Fut>(
        &self,
        token: &CancellationToken,
        mut operation: F,
    ) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let max_attempts = *self.options.max_attempts;
        let deadline_at = self.options.deadline.map(|deadline| Instant::now() + deadline);
        let mut history: Vec<E> = Vec::new();

        for attempt in 1..=max_attempts {
            if token.is_cancelled() {
                return Err(RetryError::Cancelled);
            }

            if let Some(at) = deadline_at
                && attempt > 1
                && Instant::now() >= at
            {
                return Err(RetryError::DeadlineExceeded {
                    attempts: attempt - 1,
                });
            }

            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => {
                    if !(self.classify)(&error) {
                        return Err(RetryError::NonRetryable(error));
                    }

                    if attempt == max_attempts {
                        history.push(error);
                        return Err(RetryError::Exhausted {
                            attempts: max_attempts,
                            errors: history,
                        });
                    }

                    let delay = self.options.jitter.apply(nominal_delay(
                        *self.options.base_delay,
                        *self.options.backoff_factor,
                        self.options.max_delay,
                        attempt,
                    ));

                    debug!(
                        attempt,
                        max_attempts,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %error,
                        "attempt failed, waiting before retry"
                    );

                    if let Some(hook) = &self.on_retry {
                        hook(&AttemptRecord {
                            attempt,
                            error: &error,
                            delay,
                        });
                    }

                    history.push(error);

                    if let Some(at) = deadline_at
                        && Instant::now() + delay >= at
                    {
                        return Err(RetryError::DeadlineExceeded { attempts: attempt });
                    }

                    tokio::select! {
                        _ = token.cancelled() => return Err(RetryError::Cancelled),
                        _ = self.sleeper.sleep(delay) => {}
                    }
                }
            }
        }

        unreachable!("retry loop returns on every path; max_attempts >= 1 by construction")
    } // end method execute_with_cancellation
} // end of impl
