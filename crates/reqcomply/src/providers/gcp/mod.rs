//! Google Cloud Platform provider implementations
//!
//! - Service account auth shared by Vertex AI Gemini calls
//! - Google Cloud Storage with one bucket per organization namespace

mod auth;
mod gcs_store;

pub use auth::GcpAuth;
pub use gcs_store::GcsObjectStore;
