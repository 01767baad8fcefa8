//! Retry and timeout policy for calls to the text-generation endpoint

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// One policy object shared by the HTTP client and the LLM extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Attempts per call, first try included
    pub max_attempts: u32,

    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// Per-request read timeout in seconds
    pub read_timeout_secs: u64,

    /// Delay before the second attempt in milliseconds; doubles afterwards
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            connect_timeout_secs: 10,
            read_timeout_secs: 120,
            backoff_base_ms: 500,
        }
    }
}

impl RetryPolicy {
    /// Single attempt, short timeouts (tests, interactive use)
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            connect_timeout_secs: 5,
            read_timeout_secs: 30,
            backoff_base_ms: 0,
        }
    }

    /// Connect timeout as a duration
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    /// Read timeout as a duration
    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    /// Delay to wait after failed attempt number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << exp))
    }

    /// Validate the policy
    pub fn validate(&self) -> Result<(), String> {
        if self.max_attempts == 0 {
            return Err("max_attempts must be at least 1".to_string());
        }
        if self.connect_timeout_secs == 0 || self.read_timeout_secs == 0 {
            return Err("timeouts must be positive".to_string());
        }
        Ok(())
    }
}
