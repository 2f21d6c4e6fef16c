//! One user session: its documents, its transcript, and streaming turns.

use std::ops::DerefMut;

use docqa_chat::{ChatMessage, CompletionClient, StreamChunk};
use docqa_core::{Error, Result};
use docqa_ingest::{DocumentStore, IngestOutcome, Ingester, UploadedFile};
use futures::Stream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::context::{assemble, system_prompt};
use crate::transcript::{ChatSession, ABORTED};

/// Event emitted while a turn streams.
#[derive(Debug)]
pub enum TurnEvent {
    Token(String),
    /// The turn completed and `response` was committed to the transcript.
    Done { response: String, tokens_used: usize },
    /// The turn failed; the pending user message carries the error.
    Failed(Error),
}

/// Session state owned by exactly one user.
#[derive(Debug)]
pub struct Session {
    id: String,
    documents: DocumentStore,
    chat: ChatSession,
    ingester: Ingester,
}

impl Session {
    pub fn new(id: impl Into<String>, ingester: Ingester) -> Self {
        Self {
            id: id.into(),
            documents: DocumentStore::new(),
            chat: ChatSession::new(),
            ingester,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn chat(&self) -> &ChatSession {
        &self.chat
    }

    pub fn transcript(&self) -> &[ChatMessage] {
        self.chat.messages()
    }

    pub fn document_names(&self) -> Vec<String> {
        self.documents.names()
    }

    /// Queries are accepted once a document exists and no turn is in flight.
    pub fn can_query(&self) -> bool {
        self.chat.is_idle() && !self.documents.is_empty()
    }

    /// Ingest an upload batch into this session's store.
    pub fn ingest(&mut self, files: Vec<UploadedFile>) -> Vec<IngestOutcome> {
        self.ingester.ingest_batch(&mut self.documents, files)
    }

    /// Ask `query` against the stored documents.
    pub fn ask<'a>(
        &'a mut self,
        client: &dyn CompletionClient,
        query: &str,
    ) -> Result<impl Stream<Item = TurnEvent> + Send + 'a> {
        run_turn(self, client, query)
    }
}

/// Settles the turn exactly once. Dropped unsettled, it marks the turn aborted.
struct TurnGuard<S: DerefMut<Target = Session>> {
    session: S,
    settled: bool,
}

impl<S: DerefMut<Target = Session>> TurnGuard<S> {
    fn complete(&mut self, response: &str) {
        self.settled = true;
        if let Err(e) = self.session.chat.complete_turn(response) {
            warn!("Failed to commit response: {}", e);
        }
    }

    fn fail(&mut self, error: &Error) {
        self.settled = true;
        if let Err(e) = self.session.chat.fail_turn(error.to_string()) {
            warn!("Failed to record turn failure: {}", e);
        }
    }
}

impl<S: DerefMut<Target = Session>> Drop for TurnGuard<S> {
    fn drop(&mut self) {
        if !self.settled {
            info!("Turn abandoned in session {}", self.session.id);
            let _ = self.session.chat.fail_turn(ABORTED);
        }
    }
}

/// Begin a turn on `session` and stream the answer.
///
/// Validation happens before any request is made; a rejected query returns
/// `Err` and leaves the transcript unchanged. The returned stream owns
/// `session` for its whole lifetime, so it works with both `&mut Session`
/// and an owned mutex guard.
pub fn run_turn<S>(
    mut session: S,
    client: &dyn CompletionClient,
    query: &str,
) -> Result<impl Stream<Item = TurnEvent> + Send>
where
    S: DerefMut<Target = Session> + Send,
{
    let documents_present = !session.documents.is_empty();
    session.chat.begin_turn(query, documents_present)?;

    let context = system_prompt(&assemble(&session.documents));
    debug!(
        "Session {}: asking with {} documents ({} context chars)",
        session.id,
        session.documents.len(),
        context.chars().count()
    );
    let mut upstream = client.complete(&context, session.chat.messages());
    let mut guard = TurnGuard {
        session,
        settled: false,
    };

    Ok(async_stream::stream! {
        let mut response = String::new();
        let mut token_count = 0usize;

        while let Some(chunk) = upstream.next().await {
            match chunk {
                StreamChunk::Token(token) => {
                    token_count += 1;
                    response.push_str(&token);
                    yield TurnEvent::Token(token);
                }
                StreamChunk::Done { tokens_used } => {
                    guard.complete(&response);
                    yield TurnEvent::Done { response, tokens_used };
                    return;
                }
                StreamChunk::Error(error) => {
                    warn!("Turn failed in session {}: {}", guard.session.id, error);
                    guard.fail(&error);
                    yield TurnEvent::Failed(error);
                    return;
                }
            }
        }

        // Upstream ended without a terminal chunk.
        guard.complete(&response);
        yield TurnEvent::Done { response, tokens_used: token_count };
    })
}
