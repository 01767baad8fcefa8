//! Error types for the extractors
//!
//! Only the LLM path can fail; the synchronous extractors report problems
//! as rejections on their result instead.

use thiserror::Error;

/// Errors that can occur during LLM-assisted extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Every recovery strategy failed on the model's response
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Hard deadline for the whole call, retries included, expired
    #[error("Extraction timeout after {0}s")]
    Timeout(u64),

    /// Endpoint unreachable; LLM extraction is disabled for the rest of the run
    #[error("Endpoint unavailable: {0}")]
    EndpointUnavailable(String),

    /// Retries exhausted on transport errors or non-success statuses
    #[error("Transport error after {attempts} attempts: {message}")]
    Transport {
        /// Attempts made
        attempts: u32,
        /// Last error seen
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
