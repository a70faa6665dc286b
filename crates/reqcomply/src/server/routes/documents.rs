//! Organization document endpoints

use axum::{
    extract::{Multipart, Path, State},
    Json,
};
use serde::Serialize;

use crate::documents::library::is_pdf_filename;
use crate::error::{Error, Result};
use crate::providers::ObjectInfo;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentListResponse {
    pub organization_id: String,
    pub documents: Vec<ObjectInfo>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub organization_id: String,
    pub files: Vec<String>,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResponse {
    pub organization_id: String,
    pub document: String,
    pub message: String,
}

struct UploadedFile {
    filename: String,
    data: Vec<u8>,
}

/// File parts plus the optional `organizationId` text field
async fn read_upload(mut multipart: Multipart) -> Result<(Option<String>, Vec<UploadedFile>)> {
    let mut organization_id = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| Error::validation(format!("Failed to read multipart field: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        if name == "organizationId" {
            let value = field
                .text()
                .await
                .map_err(|e| Error::validation(format!("Failed to read organizationId: {}", e)))?;
            organization_id = Some(value.trim().to_string());
            continue;
        }

        let Some(filename) = field.file_name().map(|s| s.to_string()) else {
            tracing::debug!("Ignoring multipart field without filename: {}", name);
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| Error::validation(format!("Failed to read file {}: {}", filename, e)))?;

        tracing::debug!("Received file: {} ({} bytes)", filename, data.len());
        files.push(UploadedFile {
            filename,
            data: data.to_vec(),
        });
    }

    Ok((organization_id, files))
}

async fn store_files(
    state: &AppState,
    organization_id: String,
    files: Vec<UploadedFile>,
) -> Result<Json<UploadResponse>> {
    if files.is_empty() {
        return Err(Error::validation("No files provided"));
    }
    if let Some(bad) = files.iter().find(|f| !is_pdf_filename(&f.filename)) {
        return Err(Error::UnsupportedFileType(format!(
            "Only PDF files are allowed. Got: {}",
            bad.filename
        )));
    }

    let mut stored = Vec::with_capacity(files.len());
    for file in files {
        let name = state
            .library()
            .upload(&organization_id, &file.filename, &file.data)
            .await?;
        stored.push(name);
    }

    tracing::info!(
        "Uploaded {} files for organization {}",
        stored.len(),
        organization_id
    );

    Ok(Json(UploadResponse {
        organization_id,
        message: format!("Successfully uploaded {} files", stored.len()),
        files: stored,
    }))
}

/// GET /api/organizations/:org/documents - List an organization's documents
pub async fn list_documents(
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
) -> Result<Json<DocumentListResponse>> {
    let documents = state.library().list(&organization_id).await?;

    Ok(Json(DocumentListResponse {
        organization_id,
        count: documents.len(),
        documents,
    }))
}

/// POST /api/organizations/:org/documents - Upload regulation PDFs
pub async fn upload_documents(
    State(state): State<AppState>,
    Path(organization_id): Path<String>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let (_, files) = read_upload(multipart).await?;
    store_files(&state, organization_id, files).await
}

/// POST /api/upload - Legacy upload with the organization as a form field
pub async fn upload_legacy(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let (organization_id, files) = read_upload(multipart).await?;
    let organization_id = organization_id
        .filter(|o| !o.is_empty())
        .ok_or_else(|| Error::validation("organizationId form field is required"))?;
    store_files(&state, organization_id, files).await
}

/// DELETE /api/organizations/:org/documents/:name - Delete one document
pub async fn delete_document(
    State(state): State<AppState>,
    Path((organization_id, document_name)): Path<(String, String)>,
) -> Result<Json<DeleteResponse>> {
    state
        .library()
        .delete(&organization_id, &document_name)
        .await?;

    Ok(Json(DeleteResponse {
        organization_id,
        document: document_name,
        message: "Document deleted successfully".to_string(),
    }))
}
