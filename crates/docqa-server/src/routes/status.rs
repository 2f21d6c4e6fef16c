//! Service status.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::state::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/status", get(get_status))
}

/// GET /api/status
async fn get_status(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let completion = state.completion_config.as_ref();

    Json(serde_json::json!({
        "llmConfigured": state.llm_configured(),
        "provider": completion.map(|c| c.provider.to_string()),
        "model": state.completion.as_ref().map(|c| c.model().to_string()),
        "chunkSize": state.config.chunking.chunk_size(),
        "chunkOverlap": state.config.chunking.chunk_overlap(),
        "sessions": state.sessions.len(),
    }))
}
