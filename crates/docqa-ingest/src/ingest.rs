//! Upload ingestion pipeline: file → text → chunks → store.

use docqa_core::Error;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::chunking::RecursiveChunker;
use crate::extract;
use crate::store::DocumentStore;
use crate::upload::UploadedFile;

/// Result of ingesting one file of a batch.
#[derive(Debug)]
pub enum IngestOutcome {
    Processed {
        name: String,
        chunks: usize,
        characters: usize,
    },
    /// A document with this name is already stored.
    Skipped { name: String },
    Failed { name: String, error: Error },
}

/// Serializable view of an outcome for API responses.
#[derive(Debug, Clone, Serialize)]
pub struct OutcomeReport {
    pub filename: String,
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

impl IngestOutcome {
    pub fn name(&self) -> &str {
        match self {
            Self::Processed { name, .. } | Self::Skipped { name } | Self::Failed { name, .. } => {
                name
            }
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Stable status tag: `processed`, `skipped` or `failed`.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Processed { .. } => "processed",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }

    /// User-visible status line.
    pub fn message(&self) -> String {
        match self {
            Self::Processed { name, .. } => format!("Processed {}", name),
            Self::Skipped { name } => format!("Already processed {}", name),
            Self::Failed {
                error: error @ Error::UnsupportedType { .. },
                ..
            } => error.to_string(),
            Self::Failed { name, error } => format!("Error processing {}: {}", name, error),
        }
    }

    pub fn report(&self) -> OutcomeReport {
        let kind = match self {
            Self::Failed { error, .. } => Some(error.kind()),
            _ => None,
        };
        OutcomeReport {
            filename: self.name().to_string(),
            status: self.status(),
            message: self.message(),
            kind,
        }
    }
}

/// Handles document ingestion: text extraction, chunking, and storage.
#[derive(Debug, Clone, Default)]
pub struct Ingester {
    chunker: RecursiveChunker,
}

impl Ingester {
    pub fn new(chunker: RecursiveChunker) -> Self {
        Self { chunker }
    }

    pub fn chunker(&self) -> &RecursiveChunker {
        &self.chunker
    }

    /// Ingest a batch. Every file is handled independently and outcomes come
    /// back in input order; a failing file never stops its siblings.
    pub fn ingest_batch(
        &self,
        store: &mut DocumentStore,
        files: Vec<UploadedFile>,
    ) -> Vec<IngestOutcome> {
        let outcomes: Vec<IngestOutcome> = files
            .into_iter()
            .map(|file| self.ingest_file(store, file))
            .collect();

        let failed = outcomes.iter().filter(|o| o.is_failure()).count();
        info!(
            "Ingested batch of {} files ({} failed), {} documents stored",
            outcomes.len(),
            failed,
            store.len()
        );
        outcomes
    }

    /// Ingest one file unless a document with the same name is stored.
    pub fn ingest_file(&self, store: &mut DocumentStore, file: UploadedFile) -> IngestOutcome {
        if store.has(&file.name) {
            debug!("Already processed, skipping: {}", file.name);
            return IngestOutcome::Skipped { name: file.name };
        }

        let text = match extract::extract_text(&file.name, &file.bytes, &file.mime_type) {
            Ok(text) => text,
            Err(error) => {
                warn!("Failed to ingest {}: {}", file.name, error);
                return IngestOutcome::Failed {
                    name: file.name,
                    error,
                };
            }
        };

        // Chunks are rejoined immediately; nothing downstream selects among them.
        let chunks: Vec<String> = self.chunker.split(&text).collect();
        let content = chunks.join("\n\n");
        let characters = content.chars().count();

        store.put(file.name.clone(), content);
        info!(
            "Processed {} ({} chunks, {} chars)",
            file.name,
            chunks.len(),
            characters
        );

        IngestOutcome::Processed {
            name: file.name,
            chunks: chunks.len(),
            characters,
        }
    }
}
