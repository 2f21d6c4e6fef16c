//! HTTP route handlers.

pub mod chat;
pub mod documents;
pub mod sessions;
pub mod status;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::{Json, Router};
use docqa_core::Error;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::state::AppState;

/// Build the main Axum router with all routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .nest("/api", api_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(status::routes())
        .merge(sessions::routes())
        .merge(documents::routes())
        .merge(chat::routes())
}

pub type ApiError = (StatusCode, Json<serde_json::Value>);

/// Map a library error to an HTTP status and `{error, kind}` body.
pub fn error_response(err: Error) -> ApiError {
    let status = match &err {
        Error::NotFound(_) => StatusCode::NOT_FOUND,
        Error::Rejected(_) => StatusCode::CONFLICT,
        Error::Decode { .. } | Error::Parse { .. } | Error::UnsupportedType { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        Error::Auth(_) => StatusCode::SERVICE_UNAVAILABLE,
        Error::RateLimit(_) => StatusCode::TOO_MANY_REQUESTS,
        Error::Transport(_) => StatusCode::BAD_GATEWAY,
        Error::Config(_) | Error::Io(_) | Error::Json(_) | Error::Internal(_) => {
            error!("Request failed: {}", err);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    (
        status,
        Json(serde_json::json!({
            "error": err.to_string(),
            "kind": err.kind(),
        })),
    )
}

pub fn bad_request(message: &str) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(serde_json::json!({ "error": message, "kind": "bad_request" })),
    )
}
