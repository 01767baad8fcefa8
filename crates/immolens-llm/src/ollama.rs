//! Ollama Provider Implementation
//!
//! Talks to a local or remote Ollama instance over its HTTP API.
//!
//! # Features
//!
//! - `POST /api/generate` with streaming disabled and optional JSON mode
//! - Connect and read timeouts taken from a shared [`RetryPolicy`]
//! - `GET /api/tags` availability probe
//!
//! One `generate` call is one HTTP round trip. Retrying is the caller's job,
//! so that a single hard deadline can cover the whole retry loop.
//!
//! # Examples
//!
//! ```no_run
//! use immolens_domain::RetryPolicy;
//! use immolens_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "qwen2.5:7b", &RetryPolicy::default())
//!     .expect("client");
//! ```

use crate::LlmError;
use immolens_domain::{GenerationRequest, LlmProvider, RetryPolicy};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Longest error body kept in [`LlmError::Status`]
const MAX_ERROR_BODY: usize = 200;

/// Ollama API provider
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Request body for Ollama generate API
#[derive(Debug, Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: GenerateOptions,
}

/// Response from Ollama generate API
#[derive(Debug, Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Result of an availability probe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelStatus {
    /// Endpoint answered the probe
    pub reachable: bool,

    /// Configured model is installed
    pub model_installed: bool,

    /// Every model the endpoint reported
    pub installed: Vec<String>,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// Connect and read timeouts come from `policy`; its attempt count is
    /// used by the caller, not here.
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        policy: &RetryPolicy,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .connect_timeout(policy.connect_timeout())
            .timeout(policy.read_timeout())
            .build()
            .map_err(|e| LlmError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            client,
        })
    }

    /// Provider on `http://localhost:11434` with the default policy
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, model, &RetryPolicy::default())
    }

    /// Configured endpoint
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Configured model
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Ask the endpoint which models it has
    ///
    /// A refused connection is reported as `reachable: false` rather than
    /// an error; other failures are returned.
    pub async fn check_availability(&self) -> Result<ModelStatus, LlmError> {
        let url = format!("{}/api/tags", self.endpoint);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) if e.is_connect() => {
                debug!(endpoint = %self.endpoint, error = %e, "Ollama not reachable");
                return Ok(ModelStatus {
                    reachable: false,
                    model_installed: false,
                    installed: Vec::new(),
                });
            }
            Err(e) => return Err(e.into()),
        };

        if !response.status().is_success() {
            return Err(LlmError::Status {
                status: response.status().as_u16(),
                body: String::new(),
            });
        }

        let tags: TagsResponse = response.json().await?;
        let installed: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        let model_installed = installed.iter().any(|name| model_matches(name, &self.model));

        Ok(ModelStatus {
            reachable: true,
            model_installed,
            installed,
        })
    }
}

/// Ollama reports tagged names ("llama3:latest"); a bare configured name
/// matches any tag of that model
fn model_matches(installed: &str, wanted: &str) -> bool {
    installed == wanted
        || installed
            .strip_prefix(wanted)
            .is_some_and(|rest| rest.starts_with(':'))
}

fn truncate(body: &str) -> String {
    body.chars().take(MAX_ERROR_BODY).collect()
}

impl LlmProvider for OllamaProvider {
    type Error = LlmError;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, Self::Error> {
        let url = format!("{}/api/generate", self.endpoint);
        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            format: request.json_output.then_some("json"),
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: request.max_tokens,
            },
        };

        debug!(
            model = %self.model,
            prompt_chars = request.prompt.len(),
            "Sending generate request"
        );

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                status: status.as_u16(),
                body: truncate(&text),
            });
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        Ok(parsed.response)
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ollama_provider_creation() {
        let provider =
            OllamaProvider::new("http://localhost:11434/", "qwen2.5:7b", &RetryPolicy::default())
                .unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:11434");
        assert_eq!(provider.model(), "qwen2.5:7b");
    }

    #[test]
    fn test_ollama_provider_default_endpoint() {
        let provider = OllamaProvider::default_endpoint("mistral").unwrap();
        assert_eq!(provider.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_request_body_shape() {
        let body = OllamaGenerateRequest {
            model: "qwen2.5:7b",
            prompt: "extract",
            stream: false,
            format: Some("json"),
            options: GenerateOptions {
                temperature: 0.1,
                num_predict: Some(2000),
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["format"], "json");
        assert_eq!(json["options"]["num_predict"], 2000);
    }

    #[test]
    fn test_request_body_without_json_mode() {
        let body = OllamaGenerateRequest {
            model: "m",
            prompt: "p",
            stream: false,
            format: None,
            options: GenerateOptions {
                temperature: 0.0,
                num_predict: None,
            },
        };
        let json = serde_json::to_value(&body).unwrap();
        assert!(json.get("format").is_none());
        assert!(json["options"].get("num_predict").is_none());
    }

    #[test]
    fn test_tags_parsing_and_model_match() {
        let tags: TagsResponse = serde_json::from_str(
            r#"{"models": [{"name": "llama3:latest", "size": 1}, {"name": "qwen2.5:7b"}]}"#,
        )
        .unwrap();
        let names: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();
        assert!(names.iter().any(|n| model_matches(n, "llama3")));
        assert!(names.iter().any(|n| model_matches(n, "qwen2.5:7b")));
        assert!(!names.iter().any(|n| model_matches(n, "llama")));
    }

    #[test]
    fn test_truncate_error_body() {
        let long = "x".repeat(1000);
        assert_eq!(truncate(&long).len(), MAX_ERROR_BODY);
    }

    #[tokio::test]
    async fn test_ollama_unreachable_endpoint() {
        let policy = RetryPolicy {
            connect_timeout_secs: 1,
            read_timeout_secs: 1,
            ..RetryPolicy::no_retry()
        };
        let provider = OllamaProvider::new("http://127.0.0.1:1", "m", &policy).unwrap();
        let result = provider.generate(&GenerationRequest::new("test")).await;
        assert!(matches!(
            result,
            Err(LlmError::Unavailable(_)) | Err(LlmError::Communication(_))
        ));
    }

    // Requires a running Ollama
    #[tokio::test]
    #[ignore]
    async fn test_ollama_availability_integration() {
        let provider = OllamaProvider::default_endpoint("qwen2.5:7b").unwrap();
        let status = provider.check_availability().await.unwrap();
        assert!(status.reachable);
    }
}
