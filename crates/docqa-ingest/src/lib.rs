//! DocQA Ingest — file text extraction, chunking, and the per-session document store.

pub mod chunking;
pub mod extract;
pub mod ingest;
pub mod store;
pub mod upload;

pub use chunking::{Chunk, Chunks, RecursiveChunker};
pub use extract::extract_text;
pub use ingest::{IngestOutcome, Ingester};
pub use store::{DocumentRecord, DocumentStore};
pub use upload::{MimeType, UploadedFile};
