//! Immolens LLM Provider Layer
//!
//! Implementations of the `LlmProvider` trait from `immolens-domain`.
//!
//! # Providers
//!
//! - `MockProvider`: Scripted responses and failures for tests
//! - `OllamaProvider`: Ollama HTTP API
//!
//! # Examples
//!
//! ```
//! use immolens_domain::{GenerationRequest, LlmProvider};
//! use immolens_llm::MockProvider;
//!
//! let provider = MockProvider::new(r#"{"price": 200000}"#);
//! let request = GenerationRequest::new("extract");
//! let result = tokio_test::block_on(provider.generate(&request)).unwrap();
//! assert_eq!(result, r#"{"price": 200000}"#);
//! ```

#![warn(missing_docs)]

pub mod error;
pub mod ollama;

use immolens_domain::{GenerationRequest, LlmProvider};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

pub use error::LlmError;
pub use ollama::{ModelStatus, OllamaProvider};

#[derive(Debug, Clone)]
enum Scripted {
    Reply(String),
    Unavailable,
    Status(u16),
}

#[derive(Debug, Default)]
struct MockState {
    script: VecDeque<Scripted>,
    requests: Vec<GenerationRequest>,
}

/// Mock LLM provider for deterministic testing
///
/// Scripted outcomes are consumed in order; once the script is empty every
/// call returns the default response. Clones share state, so a test can keep
/// a handle and inspect calls made through another clone.
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_response: String,
    delay: Option<Duration>,
    state: Arc<Mutex<MockState>>,
}

impl MockProvider {
    /// Create a new MockProvider with a fixed response for all calls
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            delay: None,
            state: Arc::new(Mutex::new(MockState::default())),
        }
    }

    /// Sleep before answering each call
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Queue a successful response
    pub fn push_response(&self, response: impl Into<String>) {
        self.lock().script.push_back(Scripted::Reply(response.into()));
    }

    /// Queue a connection failure
    pub fn push_unavailable(&self) {
        self.lock().script.push_back(Scripted::Unavailable);
    }

    /// Queue a non-success HTTP status
    pub fn push_status(&self, status: u16) {
        self.lock().script.push_back(Scripted::Status(status));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        self.lock().requests.len()
    }

    /// The most recent request
    pub fn last_request(&self) -> Option<GenerationRequest> {
        self.lock().requests.last().cloned()
    }

    /// Reset the call history
    pub fn reset_call_count(&self) {
        self.lock().requests.clear();
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("{}")
    }
}

impl LlmProvider for MockProvider {
    type Error = LlmError;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, Self::Error> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let next = {
            let mut state = self.lock();
            state.requests.push(request.clone());
            state.script.pop_front()
        };

        match next {
            Some(Scripted::Reply(text)) => Ok(text),
            Some(Scripted::Unavailable) => Err(LlmError::Unavailable("mock: connection refused".into())),
            Some(Scripted::Status(status)) => Err(LlmError::Status {
                status,
                body: "mock failure".into(),
            }),
            None => Ok(self.default_response.clone()),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
