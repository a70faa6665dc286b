//! API routes for the analysis server

pub mod analysis;
pub mod documents;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all `/api` routes
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        // Async analysis
        .route("/ai", post(analysis::submit_job).get(analysis::job_status))
        .route("/jobs", get(analysis::list_jobs))
        // Organization documents - with larger body limit for uploads
        .route(
            "/organizations/:organization_id/documents",
            get(documents::list_documents)
                .post(documents::upload_documents)
                .layer(DefaultBodyLimit::max(max_upload_size)),
        )
        .route(
            "/organizations/:organization_id/documents/:document_name",
            delete(documents::delete_document),
        )
        .route(
            "/upload",
            post(documents::upload_legacy).layer(DefaultBodyLimit::max(max_upload_size)),
        )
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "reqcomply",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Requirements analysis against INCOSE/EARS and organization regulations",
        "endpoints": {
            "POST /analyze-requirement": "Run the three-stage analysis and wait for the result",
            "POST /api/ai": "Queue an analysis job",
            "GET /api/ai?runId=&organizationId=": "Poll a queued job",
            "GET /api/jobs": "List jobs and queue stats",
            "GET /api/organizations/:organization_id/documents": "List regulation documents",
            "POST /api/organizations/:organization_id/documents": "Upload regulation PDFs",
            "DELETE /api/organizations/:organization_id/documents/:document_name": "Delete a document",
            "POST /api/upload": "Legacy upload (organizationId form field)"
        },
        "stages": {
            "stage1": "INCOSE and EARS standards rewrite",
            "stage2": "Regulatory cross-reference against the named document",
            "stage3": "Compliance synthesis and final requirement"
        }
    }))
}
