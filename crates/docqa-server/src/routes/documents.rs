//! Document upload and listing for a session.

use std::sync::Arc;

use axum::extract::{Multipart, Path, State};
use axum::routing::post;
use axum::{Json, Router};
use docqa_core::Error;
use docqa_ingest::{MimeType, UploadedFile};
use tracing::info;

use super::{bad_request, error_response, ApiError};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/sessions/{id}/documents",
        post(upload_documents).get(list_documents),
    )
}

/// POST /api/sessions/{id}/documents — ingest a multipart batch.
///
/// Every file field is ingested in the order received; per-file failures are
/// reported in `results` and never fail the request.
async fn upload_documents(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> Result<Json<serde_json::Value>, ApiError> {
    let mut session = state.sessions.try_acquire(&id).map_err(error_response)?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(&format!("Invalid multipart body: {}", e)))?
    {
        let filename = match field.file_name() {
            Some(name) => name.to_string(),
            None => continue,
        };
        let mime_type = MimeType::resolve(field.content_type(), &filename);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| bad_request(&format!("Failed to read {}: {}", filename, e)))?;
        files.push(UploadedFile::new(filename, mime_type, bytes.to_vec()));
    }

    if files.is_empty() {
        return Err(bad_request("No files in upload"));
    }

    info!("Session {}: ingesting {} files", id, files.len());

    // PDF parsing is CPU-bound.
    let (outcomes, documents) = tokio::task::spawn_blocking(move || {
        let outcomes = session.ingest(files);
        (outcomes, session.document_names())
    })
    .await
    .map_err(|e| error_response(Error::Internal(format!("ingest task failed: {}", e))))?;

    let count = |status: &str| outcomes.iter().filter(|o| o.status() == status).count();
    let results: Vec<_> = outcomes.iter().map(|o| o.report()).collect();

    Ok(Json(serde_json::json!({
        "processed": count("processed"),
        "skipped": count("skipped"),
        "failed": count("failed"),
        "results": results,
        "documents": documents,
    })))
}

/// GET /api/sessions/{id}/documents
async fn list_documents(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| error_response(Error::NotFound(format!("session {}", id))))?;
    let session = session.lock().await;

    let documents: Vec<_> = session
        .documents()
        .all()
        .map(|doc| {
            serde_json::json!({
                "filename": doc.source_name,
                "characters": doc.content.chars().count(),
            })
        })
        .collect();

    Ok(Json(serde_json::json!({
        "total": documents.len(),
        "documents": documents,
    })))
}
