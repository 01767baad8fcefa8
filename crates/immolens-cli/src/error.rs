//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
///
/// Extraction failures never show up here: the pipeline absorbs them into
/// missing fields. These are setup and I/O problems only.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Extractor setup error
    #[error("Extractor error: {0}")]
    Extractor(#[from] immolens_extractor::ExtractorError),

    /// Reconciler setup error
    #[error("Reconciler error: {0}")]
    Reconciler(#[from] immolens_reconciler::ReconcilerError),

    /// Gate setup error
    #[error("Gatekeeper error: {0}")]
    Gatekeeper(#[from] immolens_gatekeeper::GatekeeperError),

    /// Text-generation endpoint error
    #[error("LLM error: {0}")]
    Llm(#[from] immolens_llm::LlmError),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
