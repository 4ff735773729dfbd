//! Error types returned by the retry executors.

use std::error::Error;
use thiserror::Error;

/// Terminal failure of a retried call.
///
/// A caller sees exactly one of these per failed call: either the arguments
/// were rejected before the operation ran, or every attempt failed. Failures
/// from non-final attempts are never surfaced.
#[derive(Debug, Error)]
pub enum RetryError<E: Error + 'static> {
    /// The call was rejected before any attempt was made.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Every allowed attempt failed.
    ///
    /// `source` holds the failure of the final attempt. It is `None` only if
    /// the loop finished without recording one.
    #[error("{}", exhausted_message(.attempts, .source))]
    Exhausted {
        /// Number of attempts made.
        attempts: u32,
        /// Failure of the last attempt.
        #[source]
        source: Option<E>,
    },
}

fn exhausted_message<E: Error>(attempts: &u32, source: &Option<E>) -> String {
    match source {
        Some(cause) => format!("retry exhausted after {attempts} attempt(s): {cause}"),
        None => "retry to execute operation failed".to_string(),
    }
}

impl<E: Error + 'static> RetryError<E> {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Returns `true` if the call was rejected during validation.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Self::InvalidArgument(_))
    }

    /// Returns `true` if the attempt budget was consumed.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::Exhausted { .. })
    }

    /// Number of attempts made before giving up (0 for validation errors).
    pub fn attempts(&self) -> u32 {
        match self {
            Self::InvalidArgument(_) => 0,
            Self::Exhausted { attempts, .. } => *attempts,
        }
    }

    /// Borrow the last underlying failure, if any.
    pub fn cause(&self) -> Option<&E> {
        match self {
            Self::Exhausted { source, .. } => source.as_ref(),
            Self::InvalidArgument(_) => None,
        }
    }

    /// Take ownership of the last underlying failure, if any.
    pub fn into_cause(self) -> Option<E> {
        match self {
            Self::Exhausted { source, .. } => source,
            Self::InvalidArgument(_) => None,
        }
    }
}
