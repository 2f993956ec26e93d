use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Terminal error for a retry execution
///
/// Only two failures cross the component boundary: exhaustion of the
/// attempt budget and cancellation. Per-attempt failures are handled
/// inside the retry loop and are visible through [`FailureInfo`] and the
/// executor hooks only.
///
/// The error type is generic over `E`, the error produced by the wrapped
/// operation, and preserves the final attempt's error unchanged so callers
/// can pattern-match on it.
#[derive(Debug, Error)]
pub enum RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Every attempt in the budget failed; carries the final attempt's error
    #[error("retries exhausted after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: E,
    },

    /// The execution was cancelled, either explicitly or by a newer
    /// execution starting on the same executor
    #[error("operation aborted after {attempts} attempts")]
    Aborted { attempts: u32 },
}

impl<E> RetryError<E>
where
    E: std::error::Error + 'static,
{
    /// Number of attempts made before this outcome
    pub fn attempts(&self) -> u32 {
        match self {
            RetryError::Exhausted { attempts, .. } => *attempts,
            RetryError::Aborted { attempts } => *attempts,
        }
    }

    /// Check whether the attempt budget was exhausted
    pub fn is_exhausted(&self) -> bool {
        matches!(self, RetryError::Exhausted { .. })
    }

    /// Check whether the execution was cancelled
    pub fn is_aborted(&self) -> bool {
        matches!(self, RetryError::Aborted { .. })
    }

    /// Get the underlying operation error, consuming this error
    pub fn into_source(self) -> Option<E> {
        match self {
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::Aborted { .. } => None,
        }
    }

    /// Get a reference to the underlying operation error
    pub fn source_ref(&self) -> Option<&E> {
        match self {
            RetryError::Exhausted { source, .. } => Some(source),
            RetryError::Aborted { .. } => None,
        }
    }
}

/// Type alias for Result with RetryError
pub type RetryResult<T, E> = std::result::Result<T, RetryError<E>>;

/// Configuration errors raised when building or loading a [`RetryPolicy`]
///
/// [`RetryPolicy`]: crate::engine::policy::RetryPolicy
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PolicyError {
    /// The policy allows zero attempts and can never run an operation
    #[error("max_attempts must be at least 1")]
    NoAttempts,

    /// I/O errors (file reading, etc.)
    #[error("IO error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("Deserialization error: {0}")]
    Deserialization(String),
}

impl PolicyError {
    /// Convert from std::io::Error
    pub fn from_io(err: std::io::Error) -> Self {
        PolicyError::Io(err.to_string())
    }

    /// Convert from serde_json::Error
    pub fn from_serde(err: serde_json::Error) -> Self {
        PolicyError::Deserialization(err.to_string())
    }
}

/// Structured record of a failed attempt, kept in [`RetryState`]
///
/// The original error value is not retained here; the record carries a
/// rendered message so callers can display the most recent failure without
/// requiring the operation error to be `Clone`.
///
/// [`RetryState`]: crate::engine::state::RetryState
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailureInfo {
    /// 1-indexed attempt that produced this failure
    pub attempt: u32,
    /// Human-readable error message
    pub message: String,
    /// Timestamp when the failure was recorded
    pub timestamp: DateTime<Utc>,
}

impl FailureInfo {
    /// Record a failure for the given attempt
    pub fn new<E: fmt::Display>(attempt: u32, error: &E) -> Self {
        Self {
            attempt,
            message: error.to_string(),
            timestamp: Utc::now(),
        }
    }
}

impl fmt::Display for FailureInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "attempt {}: {}", self.attempt, self.message)
    }
}
