//! Front door for analysis: async submission, polling and synchronous runs

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use super::pipeline::PipelineExecutor;
use super::registry::{JobRecord, JobRegistry, JobTransition, RegistryStats};
use super::worker::{JobWorker, QueuedJob};
use crate::error::{Error, Result};
use crate::types::{AnalysisRequest, AnalysisResult};

/// Coordinates the registry, the pipeline and the background worker
pub struct Orchestrator {
    registry: Arc<JobRegistry>,
    executor: Arc<PipelineExecutor>,
    sender: Mutex<Option<mpsc::UnboundedSender<QueuedJob>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    concurrency: usize,
}

impl Orchestrator {
    /// Create the orchestrator and spawn its worker on the current runtime
    pub fn new(
        executor: Arc<PipelineExecutor>,
        registry: Arc<JobRegistry>,
        concurrency: usize,
    ) -> Self {
        let (sender, receiver) = mpsc::unbounded_channel();
        let worker = JobWorker::new(executor.clone(), registry.clone(), concurrency);
        let handle = tokio::spawn(worker.run(receiver));

        Self {
            registry,
            executor,
            sender: Mutex::new(Some(sender)),
            worker: Mutex::new(Some(handle)),
            concurrency: concurrency.max(1),
        }
    }

    /// Validate, register and enqueue a request; returns without waiting
    pub fn submit(&self, request: AnalysisRequest) -> Result<Uuid> {
        request.validate()?;

        let job_id = self
            .registry
            .create(&request.organization_id, &request.regulation_document_name);
        let organization_id = request.organization_id.clone();

        let dispatched = match self.sender.lock().as_ref() {
            Some(sender) => sender.send(QueuedJob { job_id, request }).is_ok(),
            None => false,
        };

        if !dispatched {
            let message = "job worker is not running";
            self.registry
                .transition(job_id, JobTransition::Fail(message.to_string()))?;
            tracing::error!("Job {} not dispatched: {}", job_id, message);
            return Err(Error::internal(message));
        }

        tracing::info!("Queued analysis job {} for {}", job_id, organization_id);
        Ok(job_id)
    }

    /// Snapshot of a job
    pub fn get_status(&self, job_id: Uuid) -> Result<JobRecord> {
        self.registry.get(job_id)
    }

    /// Validate and run the pipeline inline, without a job record
    pub async fn run_synchronous(&self, request: AnalysisRequest) -> Result<AnalysisResult> {
        request.validate()?;
        self.executor.execute(&request).await
    }

    pub fn list_jobs(&self) -> Vec<JobRecord> {
        self.registry.list()
    }

    pub fn stats(&self) -> RegistryStats {
        self.registry.stats()
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn executor(&self) -> &Arc<PipelineExecutor> {
        &self.executor
    }

    /// Stop accepting jobs and wait for queued and running jobs to finish
    pub async fn shutdown(&self) {
        drop(self.sender.lock().take());

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            tracing::info!("Waiting for job worker to drain");
            if let Err(e) = handle.await {
                tracing::error!("Job worker ended abnormally: {}", e);
            }
        }
    }
}
