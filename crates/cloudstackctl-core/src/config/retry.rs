//! Retry configuration stored in profiles
//!
//! Only read-only commands (`list*`, `get*`, `query*`) are ever retried by the
//! client; these settings tune how hard it tries.

use cloudstack::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Retry settings for a profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Whether retry is enabled
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Total attempts, including the first one
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial backoff in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,

    /// Maximum backoff in milliseconds
    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

impl RetryConfig {
    /// The client-side policy these settings describe
    pub fn to_policy(&self) -> RetryPolicy {
        if !self.enabled || self.max_attempts <= 1 {
            return RetryPolicy::none();
        }
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms.max(self.backoff_ms)),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_backoff_ms() -> u64 {
    200
}

fn default_max_backoff_ms() -> u64 {
    5000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_client() {
        assert_eq!(RetryConfig::default().to_policy(), RetryPolicy::default());
    }

    #[test]
    fn test_disabled_means_single_attempt() {
        let config = RetryConfig {
            enabled: false,
            ..Default::default()
        };
        assert_eq!(config.to_policy(), RetryPolicy::none());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: RetryConfig = toml::from_str("max_attempts = 5").unwrap();
        assert!(config.enabled);
        assert_eq!(config.max_attempts, 5);
        assert_eq!(config.backoff_ms, 200);
    }

    #[test]
    fn test_max_backoff_never_below_initial() {
        let config = RetryConfig {
            backoff_ms: 1000,
            max_backoff_ms: 10,
            ..Default::default()
        };
        assert_eq!(config.to_policy().max_backoff, Duration::from_millis(1000));
    }
}
