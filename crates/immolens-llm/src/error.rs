//! Error types for LLM providers

use immolens_domain::ProviderError;
use thiserror::Error;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Endpoint unreachable (connection refused, DNS failure)
    #[error("Endpoint unavailable: {0}")]
    Unavailable(String),

    /// Endpoint answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly truncated
        body: String,
    },

    /// Model not installed on the endpoint
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Client could not be constructed
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProviderError for LlmError {
    fn is_unavailable(&self) -> bool {
        matches!(self, LlmError::Unavailable(_) | LlmError::ModelNotAvailable(_))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_connect() {
            LlmError::Unavailable(e.to_string())
        } else if e.is_decode() {
            LlmError::InvalidResponse(e.to_string())
        } else if e.is_builder() {
            LlmError::Config(e.to_string())
        } else {
            LlmError::Communication(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_classification() {
        assert!(LlmError::Unavailable("refused".into()).is_unavailable());
        assert!(LlmError::ModelNotAvailable("qwen".into()).is_unavailable());
        assert!(!LlmError::Status {
            status: 500,
            body: String::new()
        }
        .is_unavailable());
        assert!(!LlmError::Communication("reset".into()).is_unavailable());
    }

    #[test]
    fn test_status_message() {
        let err = LlmError::Status {
            status: 503,
            body: "busy".into(),
        };
        assert_eq!(err.to_string(), "HTTP 503: busy");
    }
}
