//! Chat route — asks a question against the session's documents and streams
//! the answer as server-sent events.

use std::convert::Infallible;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use axum::routing::post;
use axum::{Json, Router};
use docqa_chat::{ChatRequest, StreamEvent};
use docqa_core::Error;
use docqa_session::{run_turn, TurnEvent};
use futures::Stream;
use tokio_stream::StreamExt;
use tracing::info;

use super::{bad_request, error_response, ApiError};
use crate::state::AppState;

type SseStream = Pin<Box<dyn Stream<Item = Result<Event, Infallible>> + Send>>;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/sessions/{id}/chat", post(stream_chat))
}

fn event(payload: &StreamEvent) -> Event {
    Event::default().data(serde_json::to_string(payload).unwrap_or_default())
}

/// POST /api/sessions/{id}/chat
///
/// Rejections (unknown session, busy session, no documents, empty message)
/// are plain JSON errors returned before streaming starts. Once streaming,
/// the session stays locked until the answer completes or the client
/// disconnects, in which case the turn is recorded as aborted.
async fn stream_chat(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Result<Sse<SseStream>, ApiError> {
    if req.message.trim().is_empty() {
        return Err(bad_request("Message is empty"));
    }

    let session = state.sessions.try_acquire(&id).map_err(error_response)?;

    let client = state.completion.clone().ok_or_else(|| {
        error_response(Error::Auth("completion service is not configured".into()))
    })?;
    let model = client.model().to_string();
    let turn = run_turn(session, client.as_ref(), &req.message).map_err(error_response)?;

    info!("Session {}: streaming answer from {}", id, model);
    let start = Instant::now();

    let sse_stream: SseStream = Box::pin(async_stream::stream! {
        tokio::pin!(turn);
        while let Some(turn_event) = turn.next().await {
            match turn_event {
                TurnEvent::Token(content) => {
                    yield Ok::<_, Infallible>(event(&StreamEvent::Token { content }));
                }
                TurnEvent::Done { tokens_used, .. } => {
                    let duration = start.elapsed().as_millis() as u64;
                    yield Ok(event(&StreamEvent::Done {
                        model: model.clone(),
                        tokens_used,
                        duration,
                    }));
                    // Final [DONE] marker
                    yield Ok(Event::default().data("[DONE]"));
                    return;
                }
                TurnEvent::Failed(error) => {
                    yield Ok(event(&StreamEvent::Error {
                        error: error.to_string(),
                        kind: error.kind().to_string(),
                    }));
                    return;
                }
            }
        }
    });

    Ok(Sse::new(sse_stream))
}
