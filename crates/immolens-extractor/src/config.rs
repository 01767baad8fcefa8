//! Configuration for the LLM extractor

use immolens_domain::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the LLM extractor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Character budget for the page text sent to the model
    pub html_max_chars: usize,

    /// Hard deadline for one extraction, retries included (seconds)
    pub call_timeout_secs: u64,

    /// Sampling temperature
    pub temperature: f32,

    /// Upper bound on generated tokens
    pub max_tokens: Option<u32>,

    /// Ask the endpoint for JSON output
    pub json_output: bool,

    /// Attempt count and per-request timeouts
    pub retry: RetryPolicy,
}

impl ExtractorConfig {
    /// Get the call deadline as a Duration
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.html_max_chars == 0 {
            return Err("html_max_chars must be greater than 0".to_string());
        }
        if self.call_timeout_secs == 0 {
            return Err("call_timeout_secs must be greater than 0".to_string());
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err("temperature must be between 0.0 and 2.0".to_string());
        }
        if self.max_tokens == Some(0) {
            return Err("max_tokens must be greater than 0".to_string());
        }
        self.retry.validate()
    }
}

impl Default for ExtractorConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            html_max_chars: 50_000,
            call_timeout_secs: 180,
            temperature: 0.1,
            max_tokens: Some(2_000),
            json_output: true,
            retry: RetryPolicy::default(),
        }
    }
}

impl ExtractorConfig {
    /// Aggressive preset: small budget, short deadline, fewer retries
    pub fn aggressive() -> Self {
        Self {
            html_max_chars: 20_000,
            call_timeout_secs: 60,
            temperature: 0.0,
            max_tokens: Some(1_000),
            json_output: true,
            retry: RetryPolicy {
                max_attempts: 2,
                read_timeout_secs: 45,
                ..RetryPolicy::default()
            },
        }
    }

    /// Lenient preset: large budget, long deadline, more retries
    pub fn lenient() -> Self {
        Self {
            html_max_chars: 100_000,
            call_timeout_secs: 300,
            temperature: 0.1,
            max_tokens: Some(3_000),
            json_output: true,
            retry: RetryPolicy {
                max_attempts: 4,
                read_timeout_secs: 240,
                ..RetryPolicy::default()
            },
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        assert!(ExtractorConfig::default().validate().is_ok());
        assert!(ExtractorConfig::aggressive().validate().is_ok());
        assert!(ExtractorConfig::lenient().validate().is_ok());
    }

    #[test]
    fn test_invalid_budget() {
        let config = ExtractorConfig {
            html_max_chars: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_temperature() {
        let config = ExtractorConfig {
            temperature: 3.5,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_retry_policy_propagates() {
        let mut config = ExtractorConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::lenient();
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let parsed = ExtractorConfig::from_toml("call_timeout_secs = 30").unwrap();
        assert_eq!(parsed.call_timeout_secs, 30);
        assert_eq!(parsed.html_max_chars, 50_000);
        assert_eq!(parsed.retry.max_attempts, 3);
    }
}
