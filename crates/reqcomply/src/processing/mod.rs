//! Background analysis jobs: registry, pipeline, worker and orchestrator

mod orchestrator;
mod pipeline;
mod registry;
mod worker;

pub use orchestrator::Orchestrator;
pub use pipeline::{truncate_chars, PipelineExecutor};
pub use registry::{JobRecord, JobRegistry, JobState, JobTransition, RegistryStats};
pub use worker::{JobWorker, QueuedJob, PANIC_MESSAGE};
