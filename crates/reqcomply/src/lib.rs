//! reqcomply: requirement quality and regulatory compliance analysis
//!
//! A three-stage LLM pipeline rewrites a natural-language requirement to
//! INCOSE and EARS standards, cross-references it against a regulation PDF
//! uploaded by the organization, and synthesizes a compliance verdict with a
//! final requirement. Runs are available synchronously or as polled jobs.

pub mod analysis;
pub mod config;
pub mod documents;
pub mod error;
pub mod processing;
pub mod providers;
pub mod server;
pub mod types;

pub use config::AppConfig;
pub use error::{Error, Result};
pub use processing::{JobRecord, JobState, Orchestrator};
pub use server::{state::AppState, AppServer};
pub use types::{
    AnalysisRequest, AnalysisResult, ComplianceStatus, Stage1Record, Stage2Record, Stage3Record,
};
