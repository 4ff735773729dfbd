//! Retry loops.
//!
//! [`RetryExecutor`] blocks the calling thread during backoff.
//! [`AsyncRetryExecutor`] yields to the tokio runtime instead. Both follow
//! the same state machine:
//!
//! ```text
//! Validating -> Attempting(i) -> Success
//!                             -> Failing -> Backoff -> Attempting(i + 1)
//!                             -> Failing (last) -> Exhausted
//! ```
//!
//! Attempts are strictly sequential and every failure is retried. An
//! [`Interrupted`] backoff counts as elapsed.

use crate::error::RetryError;
use crate::policy::RetryPolicy;
use crate::sleep::{AsyncSleeper, Interrupted, Sleeper, ThreadSleeper, TokioSleeper};
use std::error::Error;
use std::future::Future;
use tracing::{debug, trace, warn};

/// Runs an operation on the calling thread, sleeping between attempts.
///
/// The executor holds no per-call state, so one instance can be shared by
/// any number of callers.
///
/// # Examples
///
/// ```rust
/// use retry_executor::{RetryExecutor, RetryPolicy};
/// use std::time::Duration;
///
/// let executor = RetryExecutor::new(RetryPolicy::new(3, Duration::from_millis(1), true));
///
/// let mut calls = 0;
/// let result = executor.execute(|| {
///     calls += 1;
///     Err::<(), _>(std::io::Error::other("still down"))
/// });
///
/// let err = result.unwrap_err();
/// assert!(err.is_exhausted());
/// assert_eq!(err.cause().unwrap().to_string(), "still down");
/// assert_eq!(calls, 3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct RetryExecutor<S = ThreadSleeper> {
    policy: RetryPolicy,
    sleeper: S,
}

impl RetryExecutor {
    /// Create an executor that sleeps with `std::thread::sleep`.
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, ThreadSleeper)
    }
}

impl<S: Sleeper> RetryExecutor<S> {
    /// Create an executor with a custom sleeper.
    pub fn with_sleeper(policy: RetryPolicy, sleeper: S) -> Self {
        Self { policy, sleeper }
    }

    /// The policy this executor applies.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds or the attempt budget is spent.
    ///
    /// # Errors
    ///
    /// - [`RetryError::InvalidArgument`] if the policy allows no attempts.
    ///   The operation is not called.
    /// - [`RetryError::Exhausted`] if every attempt failed, carrying the
    ///   last failure as its source.
    pub fn execute<F, T, E>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Error + 'static,
    {
        self.policy.validate().map_err(RetryError::invalid_argument)?;

        let mut last_failure = None;
        let mut attempts = 0;
        for attempt in 0..self.policy.max_attempts {
            attempts = attempt + 1;
            match operation() {
                Ok(value) => {
                    trace!(attempts, "operation succeeded");
                    return Ok(value);
                }
                Err(err) => {
                    record_failure(&self.policy, attempts, &err);
                    last_failure = Some(err);

                    if !self.policy.has_attempt_after(attempt) {
                        break;
                    }
                    if let Some(delay) = self.policy.delay_for_retry(attempt) {
                        debug!(?delay, "backing off before next attempt");
                        if let Err(Interrupted) = self.sleeper.sleep(delay) {
                            debug!("backoff interrupted, continuing with next attempt");
                        }
                    }
                }
            }
        }

        Err(exhausted(attempts, last_failure))
    }
}

/// Runs an async operation, yielding to the runtime between attempts.
///
/// # Examples
///
/// ```rust
/// use retry_executor::{AsyncRetryExecutor, RetryPolicy};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicU32, Ordering};
/// use std::time::Duration;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let executor = AsyncRetryExecutor::new(RetryPolicy::new(5, Duration::from_millis(10), false));
///
/// let attempts = Arc::new(AtomicU32::new(0));
/// let value = executor
///     .execute(|| {
///         let attempts = Arc::clone(&attempts);
///         async move {
///             if attempts.fetch_add(1, Ordering::SeqCst) < 2 {
///                 Err(std::io::Error::other("retry me"))
///             } else {
///                 Ok(42)
///             }
///         }
///     })
///     .await?;
///
/// assert_eq!(value, 42);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AsyncRetryExecutor<S = TokioSleeper> {
    policy: RetryPolicy,
    sleeper: S,
}

impl AsyncRetryExecutor {
    /// Create an executor that sleeps with `tokio::time::sleep`.
    pub fn new(policy: RetryPolicy) -> Self {
        Self::with_sleeper(policy, TokioSleeper)
    }
}

impl<S: AsyncSleeper> AsyncRetryExecutor<S> {
    /// Create an executor with a custom sleeper.
    pub fn with_sleeper(policy: RetryPolicy, sleeper: S) -> Self {
        Self { policy, sleeper }
    }

    /// The policy this executor applies.
    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `operation` until it succeeds or the attempt budget is spent.
    ///
    /// Same contract as [`RetryExecutor::execute`]. Dropping the returned
    /// future abandons the loop.
    pub async fn execute<F, Fut, T, E>(&self, mut operation: F) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Error + 'static,
    {
        self.policy.validate().map_err(RetryError::invalid_argument)?;

        let mut last_failure = None;
        let mut attempts = 0;
        for attempt in 0..self.policy.max_attempts {
            attempts = attempt + 1;
            match operation().await {
                Ok(value) => {
                    trace!(attempts, "operation succeeded");
                    return Ok(value);
                }
                Err(err) => {
                    record_failure(&self.policy, attempts, &err);
                    last_failure = Some(err);

                    if !self.policy.has_attempt_after(attempt) {
                        break;
                    }
                    if let Some(delay) = self.policy.delay_for_retry(attempt) {
                        debug!(?delay, "backing off before next attempt");
                        if let Err(Interrupted) = self.sleeper.sleep(delay).await {
                            debug!("backoff interrupted, continuing with next attempt");
                        }
                    }
                }
            }
        }

        Err(exhausted(attempts, last_failure))
    }
}

fn record_failure<E: Error>(policy: &RetryPolicy, attempt: u32, err: &E) {
    debug!(
        attempt,
        max_attempts = policy.max_attempts,
        error = %err,
        "operation attempt failed"
    );
}

fn exhausted<E: Error + 'static>(attempts: u32, last_failure: Option<E>) -> RetryError<E> {
    match &last_failure {
        Some(err) => warn!(attempts, error = %err, "retry attempts exhausted"),
        None => warn!(attempts, "retry attempts exhausted without a recorded failure"),
    }
    RetryError::Exhausted {
        attempts,
        source: last_failure,
    }
}
