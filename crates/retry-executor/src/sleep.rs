//! Backoff suspension.
//!
//! Executors never call `std::thread::sleep` or `tokio::time::sleep`
//! directly. They go through a [`Sleeper`] (blocking) or an [`AsyncSleeper`]
//! (async), which lets callers interrupt a pending backoff or, in tests,
//! record the requested delays instead of waiting.
//!
//! A sleeper reports an early wake-up as [`Interrupted`]. The executors treat
//! that as "delay satisfied" and move on to the next attempt.

use async_trait::async_trait;
use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};
use thiserror::Error;

/// The backoff was cut short before the full delay elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("backoff sleep interrupted")]
pub struct Interrupted;

/// Blocking backoff suspension.
pub trait Sleeper {
    /// Block the calling thread for `delay`.
    fn sleep(&self, delay: Duration) -> Result<(), Interrupted>;
}

impl<S: Sleeper + ?Sized> Sleeper for &S {
    fn sleep(&self, delay: Duration) -> Result<(), Interrupted> {
        (**self).sleep(delay)
    }
}

impl<S: Sleeper + ?Sized> Sleeper for Arc<S> {
    fn sleep(&self, delay: Duration) -> Result<(), Interrupted> {
        (**self).sleep(delay)
    }
}

/// Async backoff suspension.
#[async_trait]
pub trait AsyncSleeper: Send + Sync {
    /// Yield to the runtime for `delay`.
    async fn sleep(&self, delay: Duration) -> Result<(), Interrupted>;
}

#[async_trait]
impl<S: AsyncSleeper + ?Sized> AsyncSleeper for Arc<S> {
    async fn sleep(&self, delay: Duration) -> Result<(), Interrupted> {
        (**self).sleep(delay).await
    }
}

/// Sleeps with `std::thread::sleep`. Never interrupted.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, delay: Duration) -> Result<(), Interrupted> {
        std::thread::sleep(delay);
        Ok(())
    }
}

/// Sleeps with `tokio::time::sleep`. Never interrupted.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl AsyncSleeper for TokioSleeper {
    async fn sleep(&self, delay: Duration) -> Result<(), Interrupted> {
        tokio::time::sleep(delay).await;
        Ok(())
    }
}

#[derive(Debug, Default)]
struct InterruptState {
    pending: Mutex<bool>,
    wake: Condvar,
}

/// A blocking sleeper that another thread can wake early.
///
/// Call [`InterruptibleSleeper::handle`] to get a cloneable
/// [`InterruptHandle`]. An interrupt delivered while no sleep is in progress
/// stays pending and ends the next sleep immediately.
///
/// # Examples
///
/// ```rust
/// use retry_executor::{InterruptibleSleeper, Interrupted, Sleeper};
/// use std::time::Duration;
///
/// let sleeper = InterruptibleSleeper::new();
/// sleeper.handle().interrupt();
///
/// assert_eq!(sleeper.sleep(Duration::from_secs(60)), Err(Interrupted));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InterruptibleSleeper {
    state: Arc<InterruptState>,
}

impl InterruptibleSleeper {
    /// Create a sleeper with no pending interrupt.
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle used to interrupt this sleeper from other threads.
    pub fn handle(&self) -> InterruptHandle {
        InterruptHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Sleeper for InterruptibleSleeper {
    fn sleep(&self, delay: Duration) -> Result<(), Interrupted> {
        // A poisoned lock still guards a valid flag.
        let mut pending = self
            .state
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let deadline = Instant::now().checked_add(delay);
        loop {
            if *pending {
                *pending = false;
                return Err(Interrupted);
            }

            let remaining = match deadline {
                Some(deadline) => deadline.saturating_duration_since(Instant::now()),
                None => delay,
            };
            if remaining.is_zero() {
                return Ok(());
            }

            pending = self
                .state
                .wake
                .wait_timeout(pending, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

/// Wakes an [`InterruptibleSleeper`].
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    state: Arc<InterruptState>,
}

impl InterruptHandle {
    /// Interrupt the current sleep, or the next one if none is in progress.
    pub fn interrupt(&self) {
        let mut pending = self
            .state
            .pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        *pending = true;
        self.state.wake.notify_all();
    }
}
