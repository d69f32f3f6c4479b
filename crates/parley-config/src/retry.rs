use std::time::Duration;

use serde::Deserialize;

/// Retry policy for transient upstream failures
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RetryConfig {
    /// Total attempts, including the first one
    #[serde(default = "default_attempts")]
    pub attempts: u32,
    /// Fixed wait between attempts
    #[serde(default = "default_interval", deserialize_with = "crate::duration::deserialize")]
    pub interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            interval: default_interval(),
        }
    }
}

const fn default_attempts() -> u32 {
    3
}

const fn default_interval() -> Duration {
    Duration::from_secs(1)
}
