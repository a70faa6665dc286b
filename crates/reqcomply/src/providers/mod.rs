//! Provider abstractions for model generation, object storage, and text extraction
//!
//! Trait-based seams that let the pipeline run against Gemini or a local
//! Ollama server, and against GCS, the local filesystem, or memory.

pub mod extract;
pub mod gemini;
pub mod llm;
pub mod local;
pub mod memory;
pub mod object_store;
pub mod ollama;
pub mod retry;

#[cfg(feature = "gcp")]
pub mod gcp;

pub use extract::{PdfTextExtractor, PlainTextExtractor, TextExtractor};
pub use gemini::GeminiClient;
pub use llm::{GenerationRequest, LlmProvider};
pub use local::LocalObjectStore;
pub use memory::MemoryObjectStore;
pub use object_store::{ObjectInfo, ObjectStore};
pub use ollama::OllamaLlm;
