//! Error types for DocQA.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to decode {filename} as UTF-8: {message}")]
    Decode { filename: String, message: String },

    #[error("Failed to parse {filename}: {message}")]
    Parse { filename: String, message: String },

    #[error("Unsupported file type: {filename}. Only .txt or .pdf formats are allowed.")]
    UnsupportedType { filename: String },

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Rate limited: {0}")]
    RateLimit(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rejected: {0}")]
    Rejected(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn decode(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            filename: filename.into(),
            message: message.into(),
        }
    }

    pub fn parse(filename: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse {
            filename: filename.into(),
            message: message.into(),
        }
    }

    pub fn unsupported(filename: impl Into<String>) -> Self {
        Self::UnsupportedType {
            filename: filename.into(),
        }
    }

    /// Stable tag used in API payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Decode { .. } => "decode",
            Self::Parse { .. } => "parse",
            Self::UnsupportedType { .. } => "unsupported_type",
            Self::Auth(_) => "auth",
            Self::RateLimit(_) => "rate_limit",
            Self::Transport(_) => "transport",
            Self::Rejected(_) => "rejected",
            Self::NotFound(_) => "not_found",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Json(_) => "json",
            Self::Internal(_) => "internal",
        }
    }

    /// Ingestion errors are scoped to one file and never abort a batch.
    pub fn is_ingestion(&self) -> bool {
        matches!(
            self,
            Self::Decode { .. } | Self::Parse { .. } | Self::UnsupportedType { .. }
        )
    }

    /// Completion errors end the current turn; the user may resubmit.
    pub fn is_completion(&self) -> bool {
        matches!(self, Self::Auth(_) | Self::RateLimit(_) | Self::Transport(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
