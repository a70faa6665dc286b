//! Configuration for the analysis service

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Main service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Model provider configuration
    pub llm: LlmConfig,
    /// Object storage configuration
    pub storage: StorageConfig,
    /// Background processing configuration
    pub processing: ProcessingConfig,
    /// Analysis pipeline tuning
    pub analysis: AnalysisConfig,
    /// GCP configuration (required for the gcs backend or Vertex AI)
    pub gcp: Option<GcpConfig>,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config: {}", e)))
    }

    /// Overlay environment variables on top of file/default values
    pub fn apply_env(mut self) -> Result<Self> {
        if let Ok(port) = std::env::var("PORT") {
            self.server.port = port
                .parse()
                .map_err(|_| Error::Config(format!("Invalid PORT: {}", port)))?;
        }
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                self.llm.api_key = Some(key);
            }
        }
        if let Ok(provider) = std::env::var("REQCOMPLY_LLM_PROVIDER") {
            self.llm.provider = match provider.to_lowercase().as_str() {
                "gemini" => LlmProviderKind::Gemini,
                "ollama" => LlmProviderKind::Ollama,
                other => {
                    return Err(Error::Config(format!("Unknown LLM provider: {}", other)));
                }
            };
        }
        if let Ok(url) = std::env::var("OLLAMA_BASE_URL") {
            self.llm.base_url = Some(url);
        }
        Ok(self)
    }

    /// Check cross-field constraints before startup
    pub fn validate(&self) -> Result<()> {
        if self.processing.max_concurrent_jobs == Some(0) {
            return Err(Error::Config(
                "processing.max_concurrent_jobs must be at least 1".to_string(),
            ));
        }
        if self.llm.provider == LlmProviderKind::Gemini
            && self.llm.api_key.is_none()
            && self.gcp.is_none()
        {
            return Err(Error::Config(
                "Gemini provider needs GEMINI_API_KEY or a [gcp] section for Vertex AI"
                    .to_string(),
            ));
        }
        if self.storage.backend == StorageBackend::Gcs && self.gcp.is_none() {
            return Err(Error::Config(
                "gcs storage backend selected but [gcp] config is missing".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.analysis.default_temperature) {
            return Err(Error::Config(
                "analysis.default_temperature must be within [0, 1]".to_string(),
            ));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
    /// Maximum upload size in bytes (default: 50MB)
    pub max_upload_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
            max_upload_size: 50 * 1024 * 1024,
        }
    }
}

/// Model provider selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LlmProviderKind {
    /// Google Gemini (API key, or Vertex AI with the gcp feature)
    #[default]
    Gemini,
    /// Local Ollama server
    Ollama,
}

/// Model provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Which provider to call
    pub provider: LlmProviderKind,
    /// Model name
    pub model: String,
    /// Base URL override (Ollama server, or a Gemini-compatible proxy)
    pub base_url: Option<String>,
    /// Gemini API key (usually from GEMINI_API_KEY)
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Maximum output tokens per stage
    pub max_output_tokens: u32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Retries after a failed provider call (0 = single attempt)
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: LlmProviderKind::Gemini,
            model: "gemini-1.5-flash".to_string(),
            base_url: None,
            api_key: None,
            max_output_tokens: 8192,
            timeout_secs: 180,
            max_retries: 2,
        }
    }
}

/// Object storage backend selection
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Directory per namespace on the local filesystem
    #[default]
    Local,
    /// Process-local map, lost on restart
    Memory,
    /// Google Cloud Storage bucket per namespace (gcp feature)
    Gcs,
}

/// Object storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Backend to use
    pub backend: StorageBackend,
    /// Root directory for the local backend
    pub local_root: PathBuf,
    /// Suffix appended to an organization id to form its namespace
    pub namespace_suffix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        let local_root = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("reqcomply")
            .join("documents");

        Self {
            backend: StorageBackend::Local,
            local_root,
            namespace_suffix: "-requirements".to_string(),
        }
    }
}

/// Background processing configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingConfig {
    /// Jobs allowed to run at once (default: CPU count, max 8)
    pub max_concurrent_jobs: Option<usize>,
}

impl ProcessingConfig {
    /// Effective concurrency bound
    pub fn concurrency(&self) -> usize {
        self.max_concurrent_jobs
            .unwrap_or_else(|| num_cpus::get().min(8))
            .max(1)
    }
}

/// Analysis pipeline tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Temperature used when a request omits one
    pub default_temperature: f32,
    /// Regulation text beyond this many characters is not sent to the model
    pub max_regulation_chars: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_temperature: 0.1,
            max_regulation_chars: 10_000,
        }
    }
}

/// Google Cloud Platform configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GcpConfig {
    /// Path to service account JSON key file
    pub service_account_key_path: PathBuf,
    /// GCP project ID
    pub project_id: String,
    /// Vertex AI region (e.g., "us-central1")
    #[serde(default = "default_location")]
    pub location: String,
    /// Location for auto-provisioned buckets (default: "US")
    #[serde(default = "default_bucket_location")]
    pub bucket_location: String,
    /// Route Gemini calls through Vertex AI instead of the API-key endpoint
    #[serde(default)]
    pub use_vertex: bool,
}

fn default_location() -> String {
    "us-central1".to_string()
}

fn default_bucket_location() -> String {
    "US".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.storage.namespace_suffix, "-requirements");
        assert_eq!(config.analysis.max_regulation_chars, 10_000);
        assert!(config.processing.concurrency() >= 1);
    }

    #[test]
    fn test_from_toml_partial() {
        let config = AppConfig::from_toml(
            r#"
            [server]
            port = 9000

            [llm]
            provider = "ollama"
            model = "llama3.2:3b"

            [storage]
            backend = "memory"

            [processing]
            max_concurrent_jobs = 2
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.llm.provider, LlmProviderKind::Ollama);
        assert_eq!(config.storage.backend, StorageBackend::Memory);
        assert_eq!(config.processing.concurrency(), 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_gemini_requires_credentials() {
        let config = AppConfig::default();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = AppConfig::default();
        config.llm.api_key = Some("key".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let mut config = AppConfig::default();
        config.llm.provider = LlmProviderKind::Ollama;
        config.processing.max_concurrent_jobs = Some(0);
        assert!(config.validate().is_err());
    }
}
