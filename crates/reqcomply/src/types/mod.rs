//! Core types for the analysis service

pub mod analysis;
pub mod request;

pub use analysis::{
    AnalysisResult, ComplianceStatus, RelevantPassage, Score, Stage1Record, Stage2Record,
    Stage3Record, NO_REGULATION_CONCERN,
};
pub use request::AnalysisRequest;
