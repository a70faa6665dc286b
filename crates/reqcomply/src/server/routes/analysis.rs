//! Analysis endpoints: synchronous runs, job submission and polling

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::processing::{JobRecord, JobState, RegistryStats};
use crate::server::state::AppState;
use crate::types::{AnalysisRequest, AnalysisResult};

/// Response from job submission
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitResponse {
    pub run_id: Uuid,
    pub organization_id: String,
    pub state: JobState,
    pub message: String,
}

/// Query for job status
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusQuery {
    pub run_id: String,
    pub organization_id: Option<String>,
}

/// Job status; `result` and `error` appear only in their terminal state
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub run_id: Uuid,
    pub organization_id: String,
    pub state: JobState,
    pub submitted_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<JobRecord> for StatusResponse {
    fn from(record: JobRecord) -> Self {
        Self {
            run_id: record.id,
            organization_id: record.organization_id,
            state: record.state,
            submitted_at: record.submitted_at,
            started_at: record.started_at,
            completed_at: record.completed_at,
            result: record.result,
            error: record.error,
        }
    }
}

/// One row of the job listing
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub run_id: Uuid,
    pub organization_id: String,
    pub document_name: String,
    pub state: JobState,
    pub submitted_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Job listing with registry counts
#[derive(Debug, Serialize)]
pub struct JobsResponse {
    pub jobs: Vec<JobSummary>,
    pub stats: RegistryStats,
    pub concurrency: usize,
}

/// POST /analyze-requirement - Run all three stages and wait for the result
pub async fn analyze_requirement(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<AnalysisResult>> {
    tracing::info!(
        "Synchronous analysis for {} against {}",
        request.organization_id,
        request.regulation_document_name
    );
    let result = state.orchestrator().run_synchronous(request).await?;
    Ok(Json(result))
}

/// POST /api/ai - Queue an analysis job
pub async fn submit_job(
    State(state): State<AppState>,
    Json(request): Json<AnalysisRequest>,
) -> Result<Json<SubmitResponse>> {
    let organization_id = request.organization_id.clone();
    let run_id = state.orchestrator().submit(request)?;

    Ok(Json(SubmitResponse {
        run_id,
        organization_id,
        state: JobState::Queued,
        message: "Analysis pipeline started successfully".to_string(),
    }))
}

/// GET /api/ai?runId=..&organizationId=.. - Poll a job
pub async fn job_status(
    State(state): State<AppState>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<StatusResponse>> {
    let run_id = Uuid::parse_str(query.run_id.trim())
        .map_err(|_| Error::validation(format!("Invalid runId: {}", query.run_id)))?;

    let record = state.orchestrator().get_status(run_id)?;

    // A job is only visible to the organization that submitted it
    if let Some(org) = query.organization_id.as_deref() {
        if !org.is_empty() && org != record.organization_id {
            return Err(Error::JobNotFound(run_id));
        }
    }

    Ok(Json(record.into()))
}

/// GET /api/jobs - List jobs and queue stats
pub async fn list_jobs(State(state): State<AppState>) -> Json<JobsResponse> {
    let orchestrator = state.orchestrator();
    let jobs = orchestrator
        .list_jobs()
        .into_iter()
        .map(|r| JobSummary {
            run_id: r.id,
            organization_id: r.organization_id,
            document_name: r.document_name,
            state: r.state,
            submitted_at: r.submitted_at,
            completed_at: r.completed_at,
            error: r.error,
        })
        .collect();

    Json(JobsResponse {
        jobs,
        stats: orchestrator.stats(),
        concurrency: orchestrator.concurrency(),
    })
}
