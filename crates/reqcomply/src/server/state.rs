//! Application state for the analysis server

use parking_lot::RwLock;
use std::sync::Arc;

use crate::analysis::StageAdapters;
use crate::config::{AppConfig, LlmProviderKind, StorageBackend};
use crate::documents::{DocumentLibrary, DocumentResolver};
use crate::error::{Error, Result};
use crate::processing::{JobRegistry, Orchestrator, PipelineExecutor};
use crate::providers::{
    GeminiClient, LlmProvider, LocalObjectStore, MemoryObjectStore, ObjectStore, OllamaLlm,
    PdfTextExtractor, TextExtractor,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: AppConfig,
    llm: Arc<dyn LlmProvider>,
    store: Arc<dyn ObjectStore>,
    orchestrator: Orchestrator,
    library: DocumentLibrary,
    ready: RwLock<bool>,
}

impl AppState {
    /// Build providers from configuration and start the job worker
    pub async fn new(config: AppConfig) -> Result<Self> {
        tracing::info!(
            "Initializing application state (llm: {:?}, storage: {:?})",
            config.llm.provider,
            config.storage.backend
        );

        let llm = build_llm(&config)?;
        let store = build_store(&config).await?;
        let extractor: Arc<dyn TextExtractor> = Arc::new(PdfTextExtractor::new());

        Ok(Self::from_parts(config, llm, store, extractor))
    }

    /// Assemble state from already-built providers
    pub fn from_parts(
        config: AppConfig,
        llm: Arc<dyn LlmProvider>,
        store: Arc<dyn ObjectStore>,
        extractor: Arc<dyn TextExtractor>,
    ) -> Self {
        let suffix = config.storage.namespace_suffix.clone();

        let resolver = DocumentResolver::new(store.clone(), extractor, suffix.clone());
        let executor = Arc::new(PipelineExecutor::new(
            StageAdapters::new(llm.clone()),
            resolver,
            config.analysis.clone(),
        ));
        let registry = Arc::new(JobRegistry::new());
        let concurrency = config.processing.concurrency();
        let orchestrator = Orchestrator::new(executor, registry, concurrency);
        let library = DocumentLibrary::new(store.clone(), suffix);

        tracing::info!(
            "Providers ready: llm {}/{}, storage {}, {} concurrent jobs",
            llm.name(),
            llm.model(),
            store.name(),
            concurrency
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                llm,
                store,
                orchestrator,
                library,
                ready: RwLock::new(true),
            }),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.inner.config
    }

    pub fn llm(&self) -> &Arc<dyn LlmProvider> {
        &self.inner.llm
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.inner.store
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.inner.orchestrator
    }

    pub fn library(&self) -> &DocumentLibrary {
        &self.inner.library
    }

    pub fn is_ready(&self) -> bool {
        *self.inner.ready.read()
    }

    pub fn set_ready(&self, ready: bool) {
        *self.inner.ready.write() = ready;
    }

    /// Stop accepting work and drain running jobs
    pub async fn shutdown(&self) {
        self.set_ready(false);
        self.inner.orchestrator.shutdown().await;
    }
}

fn build_llm(config: &AppConfig) -> Result<Arc<dyn LlmProvider>> {
    match config.llm.provider {
        LlmProviderKind::Ollama => {
            tracing::info!("Using Ollama model {}", config.llm.model);
            Ok(Arc::new(OllamaLlm::new(&config.llm)?))
        }
        LlmProviderKind::Gemini => {
            if let Some(gcp) = config.gcp.as_ref().filter(|g| g.use_vertex) {
                #[cfg(feature = "gcp")]
                {
                    use crate::providers::gcp::GcpAuth;

                    let auth = Arc::new(GcpAuth::from_service_account(
                        &gcp.service_account_key_path,
                        gcp.project_id.clone(),
                    )?);
                    tracing::info!(
                        "Using Gemini {} on Vertex AI ({})",
                        config.llm.model,
                        gcp.location
                    );
                    return Ok(Arc::new(GeminiClient::with_vertex(
                        &config.llm,
                        auth,
                        gcp.location.clone(),
                    )?));
                }
                #[cfg(not(feature = "gcp"))]
                {
                    let _ = gcp;
                    return Err(Error::Config(
                        "Vertex AI selected but the gcp feature is not enabled. \
                         Rebuild with --features gcp"
                            .to_string(),
                    ));
                }
            }

            let api_key = config.llm.api_key.clone().ok_or_else(|| {
                Error::Config("Gemini provider requires GEMINI_API_KEY".to_string())
            })?;
            tracing::info!("Using Gemini {} with API key", config.llm.model);
            Ok(Arc::new(GeminiClient::with_api_key(&config.llm, api_key)?))
        }
    }
}

async fn build_store(config: &AppConfig) -> Result<Arc<dyn ObjectStore>> {
    match config.storage.backend {
        StorageBackend::Local => {
            tracing::info!("Storing documents under {}", config.storage.local_root.display());
            Ok(Arc::new(LocalObjectStore::new(config.storage.local_root.clone())?))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory document storage; uploads are lost on restart");
            Ok(Arc::new(MemoryObjectStore::new()))
        }
        StorageBackend::Gcs => {
            #[cfg(feature = "gcp")]
            {
                use crate::providers::gcp::GcsObjectStore;

                let gcp = config.gcp.as_ref().ok_or_else(|| {
                    Error::Config("gcs storage backend selected but gcp config is missing".to_string())
                })?;
                tracing::info!("Using GCS buckets in project {}", gcp.project_id);
                Ok(Arc::new(GcsObjectStore::new(gcp).await?))
            }
            #[cfg(not(feature = "gcp"))]
            {
                Err(Error::Config(
                    "gcs storage backend selected but the gcp feature is not enabled. \
                     Rebuild with --features gcp"
                        .to_string(),
                ))
            }
        }
    }
}
