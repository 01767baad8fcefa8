//! LLM-assisted extraction
//!
//! One call is: compact the page, build the prompt, ask the endpoint
//! (retrying transport failures), recover a dictionary from whatever came
//! back, and validate every field exactly as the other extractors do.
//! The whole call, retries included, runs under one hard deadline.

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::preprocess::preprocess_html;
use crate::prompt::PromptBuilder;
use crate::recovery::recover;
use crate::validate::{Collector, FieldValidator};
use immolens_domain::{
    ExtractionResult, FieldName, FieldSet, GenerationRequest, LlmProvider, ProviderError, Source,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

/// How much of the raw response to show in debug logs
const RESPONSE_LOG_CHARS: usize = 300;

/// Extracts listing fields with a text-generation endpoint
///
/// After the endpoint reports itself unreachable the extractor disables
/// itself: every later call fails fast with
/// [`ExtractorError::EndpointUnavailable`] without touching the network.
pub struct LlmExtractor<L: LlmProvider> {
    provider: Arc<L>,
    validator: FieldValidator,
    config: ExtractorConfig,
    fields: Vec<FieldName>,
    disabled: AtomicBool,
}

impl<L: LlmProvider> LlmExtractor<L> {
    /// Create a new extractor; fails if `config` does not validate
    pub fn new(
        provider: L,
        validator: FieldValidator,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        Self::from_arc(Arc::new(provider), validator, config)
    }

    /// Create a new extractor sharing an existing provider
    pub fn from_arc(
        provider: Arc<L>,
        validator: FieldValidator,
        config: ExtractorConfig,
    ) -> Result<Self, ExtractorError> {
        config.validate().map_err(ExtractorError::Config)?;
        Ok(Self {
            provider,
            validator,
            config,
            fields: FieldName::ALL.to_vec(),
            disabled: AtomicBool::new(false),
        })
    }

    /// Restrict the fields named in the prompt
    pub fn with_fields(mut self, fields: &[FieldName]) -> Self {
        self.fields = fields.to_vec();
        self
    }

    /// Fields named in the prompt
    pub fn fields(&self) -> &[FieldName] {
        &self.fields
    }

    /// The configuration in use
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// True once the endpoint was found unreachable
    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::Relaxed)
    }

    /// Stop calling the endpoint for the rest of the run
    pub fn disable(&self) {
        self.disabled.store(true, Ordering::Relaxed);
    }

    /// Extract fields from `html`, giving the model `existing` to verify
    ///
    /// Errors are never fatal to the caller's record: every variant means
    /// "no new fields".
    pub async fn extract(
        &self,
        html: &str,
        existing: &FieldSet,
    ) -> Result<ExtractionResult, ExtractorError> {
        if self.is_disabled() {
            return Err(ExtractorError::EndpointUnavailable(format!(
                "{} disabled for this run",
                self.provider.name()
            )));
        }

        timeout(self.config.call_timeout(), self.extract_inner(html, existing))
            .await
            .map_err(|_| ExtractorError::Timeout(self.config.call_timeout_secs))?
    }

    async fn extract_inner(
        &self,
        html: &str,
        existing: &FieldSet,
    ) -> Result<ExtractionResult, ExtractorError> {
        let page = preprocess_html(html, self.config.html_max_chars);
        let prompt = PromptBuilder::new(page.text)
            .with_fields(&self.fields)
            .with_existing(existing)
            .with_bounds(self.validator.bounds())
            .build();

        debug!(
            prompt_chars = prompt.len(),
            truncation = ?page.truncation,
            "Built extraction prompt"
        );

        let request = GenerationRequest {
            prompt,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
            json_output: self.config.json_output,
        };

        let response = self.generate_with_retry(&request).await?;
        debug!(
            response_chars = response.len(),
            response = %response.chars().take(RESPONSE_LOG_CHARS).collect::<String>(),
            "Model response"
        );

        let recovered = recover(&response).ok_or_else(|| {
            ExtractorError::MalformedResponse(format!(
                "no JSON object in {} chars of output",
                response.len()
            ))
        })?;
        debug!(strategy = %recovered.strategy, keys = recovered.fields.len(), "Recovered fields");

        let mut collector = Collector::new(&self.validator, Source::Llm);
        let mut unknown = 0usize;
        for (key, value) in &recovered.fields {
            match FieldValidator::resolve_key(key) {
                Some(field) => {
                    collector.offer_json(field, value);
                }
                None => {
                    debug!(key = %key, "Dropping unknown key");
                    unknown += 1;
                }
            }
        }

        let result = collector.finish();
        for rejection in result.rejections() {
            warn!(
                field = %rejection.field,
                raw = %rejection.raw,
                reason = %rejection.reason,
                "Rejected model value"
            );
        }
        info!(
            accepted = result.fields().len(),
            rejected = result.rejections().len(),
            unknown,
            strategy = %recovered.strategy,
            "LLM extraction complete"
        );

        Ok(result)
    }

    /// Call the endpoint up to `retry.max_attempts` times
    ///
    /// An unavailable endpoint is not retried; it disables the extractor.
    async fn generate_with_retry(&self, request: &GenerationRequest) -> Result<String, ExtractorError> {
        let policy = &self.config.retry;
        let mut last_error = String::new();

        for attempt in 1..=policy.max_attempts {
            match self.provider.generate(request).await {
                Ok(text) => {
                    if attempt > 1 {
                        debug!(attempt, "Endpoint answered after retry");
                    }
                    return Ok(text);
                }
                Err(e) if e.is_unavailable() => {
                    warn!(provider = self.provider.name(), error = %e, "Endpoint unavailable, disabling LLM extraction");
                    self.disable();
                    return Err(ExtractorError::EndpointUnavailable(e.to_string()));
                }
                Err(e) => {
                    warn!(attempt, max = policy.max_attempts, error = %e, "Generation attempt failed");
                    last_error = e.to_string();
                    if attempt < policy.max_attempts {
                        sleep(policy.backoff(attempt)).await;
                    }
                }
            }
        }

        Err(ExtractorError::Transport {
            attempts: policy.max_attempts,
            message: last_error,
        })
    }
}
