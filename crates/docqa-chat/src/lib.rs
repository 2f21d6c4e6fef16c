//! Chat completion client with streaming responses (Azure OpenAI / OpenAI).
//!
//! Every call carries the full transcript; no conversation state is kept on
//! the server side.

pub mod config;
pub mod providers;
pub mod types;

pub use config::{CompletionConfig, Provider};
pub use providers::{BoxedStream, CompletionClient, HttpCompletionClient, StreamChunk};
pub use types::*;
