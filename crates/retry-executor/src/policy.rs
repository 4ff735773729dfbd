//! Retry policy: attempt budget and backoff schedule.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How many times to attempt an operation and how long to wait in between.
///
/// The delay before retry `i` (0-indexed, `i = 0` is the sleep after the
/// first failure) is:
///
/// ```text
/// constant:    base_delay
/// exponential: base_delay * 2^i   (saturating at Duration::MAX)
/// ```
///
/// A zero `base_delay` disables sleeping entirely.
///
/// Policies are not validated on construction. An executor rejects a policy
/// with `max_attempts == 0` before making any attempt.
///
/// # Examples
///
/// ```rust
/// use retry_executor::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::builder()
///     .max_attempts(4)
///     .base_delay(Duration::from_millis(100))
///     .exponential(true)
///     .build();
///
/// assert_eq!(policy.delay_for_retry(0), Some(Duration::from_millis(100)));
/// assert_eq!(policy.delay_for_retry(2), Some(Duration::from_millis(400)));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total number of attempts, including the first one.
    pub max_attempts: u32,
    /// Delay after the first failure.
    #[serde(with = "duration_millis")]
    pub base_delay: Duration,
    /// Double the delay after every failed retry.
    pub exponential: bool,
}

impl RetryPolicy {
    /// Create a policy from its three parameters.
    pub fn new(max_attempts: u32, base_delay: Duration, exponential: bool) -> Self {
        Self {
            max_attempts,
            base_delay,
            exponential,
        }
    }

    /// Create a new builder for configuring a policy.
    pub fn builder() -> RetryPolicyBuilder {
        RetryPolicyBuilder::default()
    }

    /// A policy that makes a single attempt and never sleeps.
    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO, false)
    }

    /// Check the policy before running it.
    ///
    /// Returns the reason the policy is unusable.
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts < 1 {
            return Err(format!(
                "max_attempts must be >= 1, got {}",
                self.max_attempts
            ));
        }
        Ok(())
    }

    /// Delay to wait before retry `retry` (0-indexed).
    ///
    /// Returns `None` when the policy does not sleep at all.
    pub fn delay_for_retry(&self, retry: u32) -> Option<Duration> {
        if self.base_delay.is_zero() {
            return None;
        }
        if !self.exponential {
            return Some(self.base_delay);
        }

        let factor = 2u32.checked_pow(retry);
        Some(
            factor
                .and_then(|factor| self.base_delay.checked_mul(factor))
                .unwrap_or(Duration::MAX),
        )
    }

    /// Whether a failed attempt (0-indexed) leaves room for another one.
    pub fn has_attempt_after(&self, attempt: u32) -> bool {
        attempt.saturating_add(1) < self.max_attempts
    }
}

impl Default for RetryPolicy {
    /// Defaults:
    /// - `max_attempts`: 3
    /// - `base_delay`: 1s
    /// - `exponential`: false
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), false)
    }
}

/// Builder for [`RetryPolicy`].
///
/// Unset fields fall back to [`RetryPolicy::default`].
#[derive(Debug, Default, Clone)]
pub struct RetryPolicyBuilder {
    max_attempts: Option<u32>,
    base_delay: Option<Duration>,
    exponential: Option<bool>,
}

impl RetryPolicyBuilder {
    /// Set the total number of attempts.
    ///
    /// Default: 3
    pub fn max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Set the delay after the first failure.
    ///
    /// Default: 1s
    pub fn base_delay(mut self, delay: Duration) -> Self {
        self.base_delay = Some(delay);
        self
    }

    /// Set the base delay from a signed millisecond count.
    ///
    /// Zero and negative values disable sleeping.
    ///
    /// ```rust
    /// use retry_executor::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::builder().base_delay_millis(-50).build();
    /// assert_eq!(policy.base_delay, Duration::ZERO);
    /// ```
    pub fn base_delay_millis(self, millis: i64) -> Self {
        self.base_delay(millis_to_duration(millis))
    }

    /// Double the delay after every failed retry.
    ///
    /// Default: false
    pub fn exponential(mut self, exponential: bool) -> Self {
        self.exponential = Some(exponential);
        self
    }

    /// Build the policy.
    pub fn build(self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy {
            max_attempts: self.max_attempts.unwrap_or(defaults.max_attempts),
            base_delay: self.base_delay.unwrap_or(defaults.base_delay),
            exponential: self.exponential.unwrap_or(defaults.exponential),
        }
    }
}

pub(crate) fn millis_to_duration(millis: i64) -> Duration {
    u64::try_from(millis)
        .map(Duration::from_millis)
        .unwrap_or(Duration::ZERO)
}

mod duration_millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    /// Rounds up, so a non-zero delay never encodes as 0 ("no sleep").
    pub fn serialize<S: Serializer>(delay: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = i64::try_from(delay.as_nanos().div_ceil(1_000_000)).unwrap_or(i64::MAX);
        serializer.serialize_i64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let millis = i64::deserialize(deserializer)?;
        Ok(super::millis_to_duration(millis))
    }
}
