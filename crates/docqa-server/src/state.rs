//! Shared application state.

use std::sync::Arc;

use docqa_chat::{CompletionClient, CompletionConfig};
use docqa_core::DocQaConfig;
use docqa_ingest::{Ingester, RecursiveChunker};
use docqa_session::SessionManager;

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: DocQaConfig,
    /// `None` when credentials were missing at startup.
    pub completion: Option<Arc<dyn CompletionClient>>,
    pub completion_config: Option<CompletionConfig>,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(
        config: DocQaConfig,
        completion: Option<Arc<dyn CompletionClient>>,
        completion_config: Option<CompletionConfig>,
    ) -> Self {
        let ingester = Ingester::new(RecursiveChunker::from_preset(config.chunking));
        let sessions = SessionManager::new(config.max_sessions, ingester);
        Self {
            config,
            completion,
            completion_config,
            sessions,
        }
    }

    pub fn llm_configured(&self) -> bool {
        self.completion.is_some()
    }
}
