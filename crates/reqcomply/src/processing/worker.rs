//! Background worker that runs queued analysis jobs

use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use uuid::Uuid;

use super::pipeline::PipelineExecutor;
use super::registry::{JobRegistry, JobTransition};
use crate::types::AnalysisRequest;

/// Message recorded on a job whose task panicked
pub const PANIC_MESSAGE: &str = "analysis task panicked";

/// A registered job waiting for a worker slot
#[derive(Debug)]
pub struct QueuedJob {
    pub job_id: Uuid,
    pub request: AnalysisRequest,
}

/// Worker for running analysis jobs in the background
pub struct JobWorker {
    executor: Arc<PipelineExecutor>,
    registry: Arc<JobRegistry>,
    concurrency: usize,
}

impl JobWorker {
    pub fn new(
        executor: Arc<PipelineExecutor>,
        registry: Arc<JobRegistry>,
        concurrency: usize,
    ) -> Self {
        Self {
            executor,
            registry,
            concurrency: concurrency.max(1),
        }
    }

    /// Consume jobs until the channel closes, then wait for in-flight jobs
    pub async fn run(self, mut receiver: mpsc::UnboundedReceiver<QueuedJob>) {
        tracing::info!("Job worker started: {} concurrent jobs", self.concurrency);

        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        while let Some(job) = receiver.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!("Job semaphore closed; job {} not started", job.job_id);
                    break;
                }
            };

            let executor = self.executor.clone();
            let registry = self.registry.clone();
            tasks.spawn(async move {
                let _permit = permit;
                run_isolated(&executor, &registry, job).await;
            });

            while let Some(joined) = tasks.try_join_next() {
                log_join(joined);
            }
        }

        if !tasks.is_empty() {
            tracing::info!("Job channel closed; draining {} in-flight jobs", tasks.len());
        }
        while let Some(joined) = tasks.join_next().await {
            log_join(joined);
        }

        tracing::info!("Job worker stopped");
    }
}

/// Run one job so that a panic still leaves it in a terminal state
async fn run_isolated(executor: &PipelineExecutor, registry: &JobRegistry, job: QueuedJob) {
    let job_id = job.job_id;
    let outcome = AssertUnwindSafe(executor.run_job(registry, job_id, &job.request))
        .catch_unwind()
        .await;

    match outcome {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::error!("Job {} could not be recorded: {}", job_id, e),
        Err(_) => {
            tracing::error!("Job {} panicked", job_id);
            if let Err(e) = registry.transition(job_id, JobTransition::Fail(PANIC_MESSAGE.to_string())) {
                tracing::error!("Job {} could not be marked failed: {}", job_id, e);
            }
        }
    }
}

fn log_join(joined: std::result::Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!("Job task aborted: {}", e);
    }
}
