//! Session lifecycle routes.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use docqa_core::Error;

use super::{error_response, ApiError};
use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/sessions", post(create_session).get(list_sessions))
        .route("/sessions/{id}", get(get_session).delete(delete_session))
}

/// POST /api/sessions — start a session with the greeting transcript.
async fn create_session(
    State(state): State<Arc<AppState>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let id = state.sessions.create();
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| error_response(Error::Internal("session vanished after create".into())))?;
    let session = session.lock().await;

    Ok(Json(serde_json::json!({
        "sessionId": id,
        "transcript": session.transcript(),
        "documents": session.document_names(),
    })))
}

/// GET /api/sessions
async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let sessions = state.sessions.list();
    Json(serde_json::json!({
        "total": sessions.len(),
        "sessions": sessions,
    }))
}

/// GET /api/sessions/{id} — waits for an in-flight turn to settle.
async fn get_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let session = state
        .sessions
        .get(&id)
        .ok_or_else(|| error_response(Error::NotFound(format!("session {}", id))))?;
    let session = session.lock().await;

    Ok(Json(serde_json::json!({
        "sessionId": session.id(),
        "state": session.chat().state(),
        "transcript": session.transcript(),
        "documents": session.document_names(),
        "canQuery": session.can_query(),
    })))
}

/// DELETE /api/sessions/{id}
async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    if state.sessions.remove(&id) {
        Ok(Json(serde_json::json!({ "deleted": true })))
    } else {
        Err(error_response(Error::NotFound(format!("session {}", id))))
    }
}
