//! # Retry Policy Module
//!
//! This module defines the configuration that governs a retry execution:
//! the attempt cap, the backoff strategy, and the delay bounds. Policies
//! are plain data, immutable for the duration of an execution, and can be
//! loaded from JSON documents or files.

use crate::engine::error::PolicyError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Growth formula for the delay between successive attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum BackoffStrategy {
    /// Delay grows proportionally to the attempt number
    Linear,
    /// Delay doubles after every failed attempt
    #[default]
    Exponential,
}

/// Configuration for retry behavior
///
/// All fields have serde defaults, so a policy document only needs to name
/// the fields it wants to override:
///
/// ```json
/// {
///     "max_attempts": 5,
///     "base_delay_ms": 250,
///     "backoff": "linear"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Hard cap on operation invocations per execution, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Seed delay for the backoff calculation, in milliseconds
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Strategy selecting the delay growth formula
    #[serde(default)]
    pub backoff: BackoffStrategy,
    /// Upper clamp on any computed delay, in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_ms() -> u64 {
    1000
}

fn default_max_delay_ms() -> u64 {
    30000
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            backoff: BackoffStrategy::default(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl RetryPolicy {
    /// Load a policy from a JSON string
    pub fn from_json(json_str: &str) -> Result<Self, PolicyError> {
        let policy: RetryPolicy =
            serde_json::from_str(json_str).map_err(PolicyError::from_serde)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load a policy from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PolicyError> {
        let json_str = fs::read_to_string(path).map_err(PolicyError::from_io)?;
        Self::from_json(&json_str)
    }

    /// Check that the policy describes a runnable execution
    ///
    /// A policy must allow at least one attempt; the delay fields are
    /// unsigned and need no further checks.
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_attempts == 0 {
            return Err(PolicyError::NoAttempts);
        }
        Ok(())
    }

    /// Seed delay as a [`Duration`]
    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Delay clamp as a [`Duration`]
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }

    /// Calculate the delay to wait after a failed attempt
    ///
    /// `attempt` is the 1-indexed number of the attempt that just failed.
    /// The result is clamped to `max_delay_ms`. Arithmetic saturates, so
    /// extreme attempt counts degrade to the clamp instead of wrapping.
    pub fn calculate_delay(&self, attempt: u32) -> Duration {
        let factor = match self.backoff {
            BackoffStrategy::Exponential => 2u64.saturating_pow(attempt.saturating_sub(1)),
            BackoffStrategy::Linear => u64::from(attempt),
        };

        let delay_ms = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);

        Duration::from_millis(delay_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();

        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.base_delay_ms, 1000);
        assert_eq!(policy.backoff, BackoffStrategy::Exponential);
        assert_eq!(policy.max_delay_ms, 30000);
        assert!(policy.validate().is_ok());
    }

    #[test]
    fn test_from_json_applies_defaults() {
        let policy = RetryPolicy::from_json(r#"{"max_attempts": 5}"#).unwrap();

        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.base_delay_ms, 1000);
        assert_eq!(policy.backoff, BackoffStrategy::Exponential);
        assert_eq!(policy.max_delay_ms, 30000);
    }

    #[test]
    fn test_from_json_strategy_names() {
        let linear = RetryPolicy::from_json(r#"{"backoff": "linear"}"#).unwrap();
        let exponential = RetryPolicy::from_json(r#"{"backoff": "exponential"}"#).unwrap();

        assert_eq!(linear.backoff, BackoffStrategy::Linear);
        assert_eq!(exponential.backoff, BackoffStrategy::Exponential);
    }

    #[test]
    fn test_from_json_rejects_zero_attempts() {
        let result = RetryPolicy::from_json(r#"{"max_attempts": 0}"#);

        assert_eq!(result.unwrap_err(), PolicyError::NoAttempts);
    }

    #[test]
    fn test_from_json_rejects_malformed_document() {
        let result = RetryPolicy::from_json("{not json");

        assert!(matches!(result, Err(PolicyError::Deserialization(_))));
    }

    #[test]
    fn test_exponential_delays() {
        let policy = RetryPolicy {
            max_attempts: 5,
            base_delay_ms: 1000,
            backoff: BackoffStrategy::Exponential,
            max_delay_ms: 30000,
        };

        // attempt 1: 1000 * 2^0 = 1000
        assert_eq!(policy.calculate_delay(1), Duration::from_millis(1000));
        // attempt 2: 1000 * 2^1 = 2000
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(2000));
        // attempt 3: 1000 * 2^2 = 4000
        assert_eq!(policy.calculate_delay(3), Duration::from_millis(4000));
        // attempt 4: 1000 * 2^3 = 8000
        assert_eq!(policy.calculate_delay(4), Duration::from_millis(8000));
    }

    #[test]
    fn test_linear_delays() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 1000,
            backoff: BackoffStrategy::Linear,
            max_delay_ms: 30000,
        };

        assert_eq!(policy.calculate_delay(1), Duration::from_millis(1000));
        assert_eq!(policy.calculate_delay(2), Duration::from_millis(2000));
        assert_eq!(policy.calculate_delay(3), Duration::from_millis(3000));
    }

    #[test]
    fn test_max_delay_cap() {
        let policy = RetryPolicy {
            max_attempts: 10,
            base_delay_ms: 1000,
            backoff: BackoffStrategy::Exponential,
            max_delay_ms: 5000,
        };

        // attempt 5: 1000 * 2^4 = 16000, but capped at 5000
        assert_eq!(policy.calculate_delay(5), Duration::from_millis(5000));
    }

    #[test]
    fn test_cap_applies_below_base_delay() {
        let policy = RetryPolicy {
            max_attempts: 2,
            base_delay_ms: 1000,
            backoff: BackoffStrategy::Exponential,
            max_delay_ms: 500,
        };

        // The clamp wins even when the base delay already exceeds it
        assert_eq!(policy.calculate_delay(1), Duration::from_millis(500));
    }

    #[test]
    fn test_extreme_attempt_saturates_to_cap() {
        let policy = RetryPolicy {
            max_attempts: u32::MAX,
            base_delay_ms: 1000,
            backoff: BackoffStrategy::Exponential,
            max_delay_ms: 30000,
        };

        assert_eq!(policy.calculate_delay(200), Duration::from_millis(30000));
    }

    #[test]
    fn test_zero_base_delay() {
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 0,
            backoff: BackoffStrategy::Exponential,
            max_delay_ms: 30000,
        };

        assert_eq!(policy.calculate_delay(1), Duration::ZERO);
        assert_eq!(policy.calculate_delay(3), Duration::ZERO);
    }

    #[test]
    fn test_serialized_strategy_is_lowercase() {
        assert_eq!(
            serde_json::to_string(&BackoffStrategy::Linear).unwrap(),
            "\"linear\""
        );
        assert_eq!(
            serde_json::to_string(&BackoffStrategy::Exponential).unwrap(),
            "\"exponential\""
        );
    }
}
