//! One-shot entry points.
//!
//! [`execute_with_retry`] and [`execute_with_retry_async`] take the policy as
//! plain arguments. [`Retry`] is a call builder for the same thing in which
//! the operation itself is optional, so a call assembled from parts can be
//! rejected when nothing was supplied to run.

use crate::error::RetryError;
use crate::executor::{AsyncRetryExecutor, RetryExecutor};
use crate::policy::{RetryPolicy, RetryPolicyBuilder};
use crate::sleep::{Sleeper, ThreadSleeper};
use std::error::Error;
use std::future::Future;
use std::time::Duration;

/// Run `operation` up to `max_attempts` times on the calling thread.
///
/// Sleeps `base_delay` between attempts, doubling it each time when
/// `exponential` is set. A zero `base_delay` retries immediately.
///
/// # Errors
///
/// - [`RetryError::InvalidArgument`] if `max_attempts` is 0.
/// - [`RetryError::Exhausted`] wrapping the last failure if no attempt
///   succeeded.
///
/// # Examples
///
/// ```rust
/// use retry_executor::execute_with_retry;
/// use std::time::Duration;
///
/// let err = execute_with_retry(
///     || Err::<(), _>(std::io::Error::other("unreachable host")),
///     2,
///     Duration::ZERO,
///     false,
/// )
/// .unwrap_err();
///
/// assert_eq!(
///     err.to_string(),
///     "retry exhausted after 2 attempt(s): unreachable host"
/// );
/// ```
pub fn execute_with_retry<F, T, E>(
    operation: F,
    max_attempts: u32,
    base_delay: Duration,
    exponential: bool,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
    E: Error + 'static,
{
    RetryExecutor::new(RetryPolicy::new(max_attempts, base_delay, exponential)).execute(operation)
}

/// Async counterpart of [`execute_with_retry`], sleeping on the tokio timer.
pub async fn execute_with_retry_async<F, Fut, T, E>(
    operation: F,
    max_attempts: u32,
    base_delay: Duration,
    exponential: bool,
) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Error + 'static,
{
    AsyncRetryExecutor::new(RetryPolicy::new(max_attempts, base_delay, exponential))
        .execute(operation)
        .await
}

/// Call builder for a single retried operation.
///
/// Unset policy fields fall back to [`RetryPolicy::default`]. Running without
/// an operation fails with [`RetryError::InvalidArgument`].
///
/// # Examples
///
/// ```rust
/// use retry_executor::Retry;
/// use std::time::Duration;
///
/// let mut remaining_failures = 1;
/// let value = Retry::new()
///     .operation(|| {
///         if remaining_failures > 0 {
///             remaining_failures -= 1;
///             Err(std::io::Error::other("busy"))
///         } else {
///             Ok(7)
///         }
///     })
///     .max_attempts(3)
///     .base_delay(Duration::from_millis(5))
///     .exponential(true)
///     .run()
///     .unwrap();
///
/// assert_eq!(value, 7);
/// ```
#[must_use = "a Retry does nothing until `run` is called"]
pub struct Retry<F, S = ThreadSleeper> {
    operation: Option<F>,
    policy: RetryPolicyBuilder,
    sleeper: S,
}

impl<F> Retry<F> {
    /// Start a call with the default policy and no operation.
    pub fn new() -> Self {
        Self {
            operation: None,
            policy: RetryPolicy::builder(),
            sleeper: ThreadSleeper,
        }
    }
}

impl<F> Default for Retry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F, S> Retry<F, S> {
    /// Set the operation to run.
    pub fn operation(mut self, operation: F) -> Self {
        self.operation = Some(operation);
        self
    }

    /// Set the total number of attempts.
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.policy = self.policy.max_attempts(max_attempts);
        self
    }

    /// Set the delay after the first failure.
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.policy = self.policy.base_delay(delay);
        self
    }

    /// Set the base delay from a signed millisecond count; `<= 0` disables sleeping.
    pub fn base_delay_millis(mut self, millis: i64) -> Self {
        self.policy = self.policy.base_delay_millis(millis);
        self
    }

    /// Double the delay after every failed retry.
    pub fn exponential(mut self, exponential: bool) -> Self {
        self.policy = self.policy.exponential(exponential);
        self
    }

    /// Apply every field of an existing policy.
    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = RetryPolicy::builder()
            .max_attempts(policy.max_attempts)
            .base_delay(policy.base_delay)
            .exponential(policy.exponential);
        self
    }

    /// Replace the sleeper used for backoff.
    pub fn sleeper<S2: Sleeper>(self, sleeper: S2) -> Retry<F, S2> {
        Retry {
            operation: self.operation,
            policy: self.policy,
            sleeper,
        }
    }
}

impl<F, S: Sleeper> Retry<F, S> {
    /// Validate the call and run it on the calling thread.
    ///
    /// # Errors
    ///
    /// - [`RetryError::InvalidArgument`] if no operation was set or the
    ///   policy allows no attempts. Nothing is run.
    /// - [`RetryError::Exhausted`] if every attempt failed.
    pub fn run<T, E>(self) -> Result<T, RetryError<E>>
    where
        F: FnMut() -> Result<T, E>,
        E: Error + 'static,
    {
        let operation = self
            .operation
            .ok_or_else(|| RetryError::invalid_argument("operation must be provided"))?;

        RetryExecutor::with_sleeper(self.policy.build(), self.sleeper).execute(operation)
    }
}
