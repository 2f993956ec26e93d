use crate::engine::error::FailureInfo;
use serde::{Deserialize, Serialize};

/// Observable progress of a retry execution
///
/// Each [`RetryExecutor`] owns exactly one `RetryState`, resets it at the
/// start of every execution, and mutates it as attempts run. Callers read
/// it through snapshots for progress reporting, e.g. driving a
/// "retrying, attempt 2/3" indicator.
///
/// [`RetryExecutor`]: crate::engine::executor::RetryExecutor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryState {
    /// True while an attempt or an inter-attempt wait is in progress
    pub is_running: bool,
    /// Attempts started so far in the current execution, 1-indexed
    pub current_attempt: u32,
    /// Most recent failure, cleared on success or reset
    pub last_failure: Option<FailureInfo>,
    /// False once the attempt budget was exhausted without success
    pub retryable: bool,
}

impl Default for RetryState {
    fn default() -> Self {
        Self {
            is_running: false,
            current_attempt: 0,
            last_failure: None,
            retryable: true,
        }
    }
}

impl RetryState {
    /// Return the state to its initial values
    pub(crate) fn reset(&mut self) {
        *self = Self::default();
    }

    /// Check whether any attempt has failed in the current execution
    pub fn has_failed(&self) -> bool {
        self.last_failure.is_some()
    }
}
