//! Trait definitions for the pipeline's seams
//!
//! Infrastructure implementations live in other crates.

use crate::record::ExtractionResult;
use crate::source::Source;
use std::future::Future;

/// One call to a text-generation endpoint
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Full prompt text
    pub prompt: String,

    /// Sampling temperature; keep low for deterministic output
    pub temperature: f32,

    /// Upper bound on generated tokens
    pub max_tokens: Option<u32>,

    /// Ask the endpoint to constrain output to JSON
    pub json_output: bool,
}

impl GenerationRequest {
    /// Request with deterministic defaults
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: 0.1,
            max_tokens: None,
            json_output: true,
        }
    }
}

/// Errors a provider can report
pub trait ProviderError: std::error::Error + Send + Sync + 'static {
    /// The endpoint could not be reached at all (connection refused, DNS).
    /// Callers stop using the provider for the rest of the run.
    fn is_unavailable(&self) -> bool;
}

/// Trait for text-generation endpoints
///
/// Implemented by the infrastructure layer (immolens-llm). One call is one
/// HTTP round trip; retries belong to the caller.
pub trait LlmProvider: Send + Sync {
    /// Error type for generation calls
    type Error: ProviderError;

    /// Generate a completion for the request
    fn generate(
        &self,
        request: &GenerationRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;

    /// Provider name for logging
    fn name(&self) -> &str;
}

/// Trait for synchronous page extractors
///
/// Implemented by the application layer (immolens-extractor). Extraction
/// never fails: problems surface as missing fields and rejections.
pub trait FieldExtractor: Send + Sync {
    /// Source tag attached to every value this extractor yields
    fn source(&self) -> Source;

    /// Extract fields from a page's raw HTML
    fn extract(&self, html: &str) -> ExtractionResult;
}
