//! Gemini client for stage generation
//!
//! Talks to the public Gemini API with an API key, or to Vertex AI with a
//! service account when the `gcp` feature is enabled.

use async_trait::async_trait;
use std::time::Duration;

#[cfg(feature = "gcp")]
use std::sync::Arc;

#[cfg(feature = "gcp")]
use super::gcp::GcpAuth;
use super::llm::{GenerationRequest, LlmProvider};
use super::retry::{retry_with_backoff, status_error};
use crate::config::LlmConfig;
use crate::error::{Error, Result};

const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

enum GeminiAuth {
    ApiKey { key: String, base_url: String },
    #[cfg(feature = "gcp")]
    Vertex { auth: Arc<GcpAuth>, location: String },
}

/// Gemini generateContent client
pub struct GeminiClient {
    http: reqwest::Client,
    auth: GeminiAuth,
    model: String,
    max_output_tokens: u32,
    max_retries: u32,
}

impl GeminiClient {
    /// Create a client for the public Gemini API
    pub fn with_api_key(config: &LlmConfig, api_key: String) -> Result<Self> {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_API_BASE.to_string());

        Ok(Self {
            http: build_http_client(config.timeout_secs)?,
            auth: GeminiAuth::ApiKey {
                key: api_key,
                base_url: base_url.trim_end_matches('/').to_string(),
            },
            model: config.model.clone(),
            max_output_tokens: config.max_output_tokens,
            max_retries: config.max_retries,
        })
    }

    /// Create a client for Vertex AI
    ///
    /// # Arguments
    /// * `auth` - GCP authentication
    /// * `location` - GCP region (e.g., "us-central1")
    #[cfg(feature = "gcp")]
    pub fn with_vertex(config: &LlmConfig, auth: Arc<GcpAuth>, location: String) -> Result<Self> {
        Ok(Self {
            http: build_http_client(config.timeout_secs)?,
            auth: GeminiAuth::Vertex { auth, location },
            model: config.model.clone(),
            max_output_tokens: config.max_output_tokens,
            max_retries: config.max_retries,
        })
    }

    /// Get the API endpoint URL
    fn endpoint(&self) -> String {
        match &self.auth {
            GeminiAuth::ApiKey { base_url, .. } => {
                format!("{}/v1beta/models/{}:generateContent", base_url, self.model)
            }
            #[cfg(feature = "gcp")]
            GeminiAuth::Vertex { auth, location } => format!(
                "https://{}-aiplatform.googleapis.com/v1/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
                location,
                auth.project_id(),
                location,
                self.model
            ),
        }
    }

    async fn authorize(&self, builder: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        match &self.auth {
            GeminiAuth::ApiKey { key, .. } => Ok(builder.header("x-goog-api-key", key)),
            #[cfg(feature = "gcp")]
            GeminiAuth::Vertex { auth, .. } => {
                let token = auth.get_token().await?;
                Ok(builder.bearer_auth(token))
            }
        }
    }
}

fn build_http_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))
}

#[derive(serde::Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(serde::Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(serde::Serialize)]
struct Part {
    text: String,
}

#[derive(serde::Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(serde::Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(serde::Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(serde::Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(serde::Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

fn candidate_text(response: GenerateResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| Error::provider("No candidates in Gemini response"))?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(Error::provider(format!(
            "No text in Gemini response (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        )));
    }
    Ok(text)
}

impl GeminiClient {
    async fn generate_once(&self, request: &GenerationRequest) -> Result<String> {
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts: vec![Part {
                    text: request.prompt.clone(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: self.max_output_tokens,
                response_mime_type: request.json_output.then_some("application/json"),
            },
        };

        let builder = self.authorize(self.http.post(self.endpoint())).await?;
        let response = builder
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::provider(format!("Gemini request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error("Gemini", status, &body));
        }

        let gen_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::provider(format!("Failed to parse Gemini response: {}", e)))?;

        candidate_text(gen_response)
    }
}

#[async_trait]
impl LlmProvider for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<String> {
        retry_with_backoff(self.max_retries, Duration::from_secs(1), || {
            self.generate_once(request)
        })
        .await
    }

    async fn health_check(&self) -> Result<bool> {
        match &self.auth {
            GeminiAuth::ApiKey { key, .. } => Ok(!key.is_empty()),
            #[cfg(feature = "gcp")]
            GeminiAuth::Vertex { auth, .. } => auth.get_token().await.map(|_| true),
        }
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_uses_model_and_base() {
        let config = LlmConfig {
            base_url: Some("http://proxy.local/".to_string()),
            ..LlmConfig::default()
        };
        let client = GeminiClient::with_api_key(&config, "k".to_string()).unwrap();
        assert_eq!(
            client.endpoint(),
            "http://proxy.local/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn test_candidate_text_joins_parts() {
        let response: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"parts":[{"text":"{\"a\":"},{"text":"1}"}]}}]}"#,
        )
        .unwrap();
        assert_eq!(candidate_text(response).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_candidate_text_blocked() {
        let response: GenerateResponse =
            serde_json::from_str(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#).unwrap();
        let err = candidate_text(response).unwrap_err();
        assert!(matches!(err, Error::Provider(ref m) if m.contains("SAFETY")));

        let empty: GenerateResponse = serde_json::from_str("{}").unwrap();
        assert!(matches!(candidate_text(empty), Err(Error::Provider(_))));
    }
}
