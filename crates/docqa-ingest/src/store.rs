//! Per-session document store: filename → processed text, insertion ordered.

use serde::{Deserialize, Serialize};

/// Processed text of one uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    pub source_name: String,
    pub content: String,
}

/// Append-only store keyed by source name. The first upload of a name wins;
/// later uploads with the same name are ignored.
#[derive(Debug, Clone, Default)]
pub struct DocumentStore {
    records: Vec<DocumentRecord>,
}

impl DocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document. Returns `false` (and changes nothing) when the name
    /// is already present.
    pub fn put(&mut self, name: impl Into<String>, text: impl Into<String>) -> bool {
        let name = name.into();
        if self.has(&name) {
            return false;
        }
        self.records.push(DocumentRecord {
            source_name: name,
            content: text.into(),
        });
        true
    }

    pub fn has(&self, name: &str) -> bool {
        self.records.iter().any(|r| r.source_name == name)
    }

    pub fn get(&self, name: &str) -> Option<&DocumentRecord> {
        self.records.iter().find(|r| r.source_name == name)
    }

    /// All documents in insertion order.
    pub fn all(&self) -> impl Iterator<Item = &DocumentRecord> {
        self.records.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.records.iter().map(|r| r.source_name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
