#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Retry-with-backoff execution for fallible operations.
//!
//! This crate centralizes retry policy so call sites do not hand-roll loops:
//!
//! - **Bounded attempts** via [`RetryPolicy::max_attempts`]
//! - **Constant or exponential backoff** scaled from a base delay
//! - **Last-failure chaining**: exhaustion wraps the final error as its `source`
//! - **Blocking and async executors** sharing the same policy type
//! - **Pluggable sleepers** so backoff can be interrupted, recorded or replaced
//!
//! Every failure is retried the same way. There is no jitter and no
//! retryable/fatal classification.
//!
//! # Examples
//!
//! Blocking, on the calling thread:
//!
//! ```rust
//! use retry_executor::prelude::*;
//! use std::time::Duration;
//!
//! let mut calls = 0;
//! let value = execute_with_retry(
//!     || {
//!         calls += 1;
//!         if calls < 3 {
//!             Err(std::io::Error::other("transient"))
//!         } else {
//!             Ok("ok")
//!         }
//!     },
//!     3,
//!     Duration::from_millis(1),
//!     false,
//! )
//! .unwrap();
//!
//! assert_eq!(value, "ok");
//! assert_eq!(calls, 3);
//! ```
//!
//! Async, yielding to the runtime during backoff:
//!
//! ```rust
//! use retry_executor::prelude::*;
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let executor = AsyncRetryExecutor::new(
//!     RetryPolicy::builder()
//!         .max_attempts(5)
//!         .base_delay(Duration::from_millis(100))
//!         .exponential(true)
//!         .build(),
//! );
//!
//! let value = executor
//!     .execute(|| async { Ok::<_, std::io::Error>(42) })
//!     .await?;
//! # assert_eq!(value, 42);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod policy;
pub mod retry;
pub mod sleep;

pub use config::{ConfigError, RetryConfig};
pub use error::RetryError;
pub use executor::{AsyncRetryExecutor, RetryExecutor};
pub use policy::{RetryPolicy, RetryPolicyBuilder};
pub use retry::{Retry, execute_with_retry, execute_with_retry_async};
pub use sleep::{
    AsyncSleeper, InterruptHandle, InterruptibleSleeper, Interrupted, Sleeper, ThreadSleeper,
    TokioSleeper,
};

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use retry_executor::prelude::*;
/// ```
pub mod prelude {
    pub use crate::error::RetryError;
    pub use crate::executor::{AsyncRetryExecutor, RetryExecutor};
    pub use crate::policy::{RetryPolicy, RetryPolicyBuilder};
    pub use crate::retry::{Retry, execute_with_retry, execute_with_retry_async};
    pub use crate::sleep::{AsyncSleeper, Sleeper};
}
