//! Builds the system context from every stored document.

use docqa_ingest::DocumentStore;

/// Concatenate all documents, in insertion order, as labelled blocks.
///
/// The result is not capped; a large store may exceed the model's context
/// window, which surfaces as a completion error.
pub fn assemble(store: &DocumentStore) -> String {
    store
        .all()
        .map(|doc| format!("Content of {}:\n\n{}", doc.source_name, doc.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Wrap assembled content as the system message sent ahead of the transcript.
pub fn system_prompt(assembled: &str) -> String {
    format!("Here's the file content:\n\n{}", assembled)
}
