//! LLM provider trait for stage generation

use async_trait::async_trait;

use crate::error::Result;

/// One single-shot generation call
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub temperature: f32,
    /// Ask the provider to constrain output to JSON when it supports it
    pub json_output: bool,
}

impl GenerationRequest {
    pub fn json(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature,
            json_output: true,
        }
    }
}

/// Trait for stateless text generation
///
/// Implementations:
/// - `GeminiClient`: Gemini API (API key) or Vertex AI (gcp feature)
/// - `OllamaLlm`: Local Ollama server
///
/// Errors from the call itself are reported as `Error::Provider`. Retries,
/// if any, belong inside the implementation.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate raw text for a prompt
    async fn generate(&self, request: &GenerationRequest) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
