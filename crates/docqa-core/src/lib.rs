//! DocQA Core — shared error type and service configuration.

pub mod config;
pub mod error;

pub use config::{ChunkingPreset, DocQaConfig};
pub use error::{Error, Result};
