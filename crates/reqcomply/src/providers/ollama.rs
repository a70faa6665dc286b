//! Ollama provider for local stage generation

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::llm::{GenerationRequest, LlmProvider};
use super::retry::{retry_with_backoff, status_error};
use crate::config::LlmConfig;
use crate::error::{Error, Result};

const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Ollama /api/generate client with automatic retry
pub struct OllamaLlm {
    client: Client,
    base_url: String,
    model: String,
    max_output_tokens: u32,
    max_retries: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'static str>,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

impl OllamaLlm {
    /// Create a new Ollama provider
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config
            .base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            base_url,
            model: config.model.clone(),
            max_output_tokens: config.max_output_tokens,
            max_retries: config.max_retries,
        })
    }

    async fn generate_once(&self, request: &GenerationRequest) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = GenerateRequest {
            model: &self.model,
            prompt: &request.prompt,
            stream: false,
            format: request.json_output.then_some("json"),
            options: GenerateOptions {
                temperature: request.temperature,
                num_predict: self.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::provider(format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(status_error("Ollama", status, &text));
        }

        let generated: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("Failed to parse Ollama response: {}", e)))?;

        Ok(generated.response)
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        retry_with_backoff(self.max_retries, Duration::from_secs(1), || {
            self.generate_once(request)
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }

    fn model(&self) -> &str {
        &self.model
    }
}
