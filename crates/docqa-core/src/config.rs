//! Service configuration from environment variables.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Chunk size / overlap pairs used by the two pipeline variants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkingPreset {
    /// 1000 characters with 200 characters of overlap.
    #[default]
    Standard,
    /// 1000 characters with 100 characters of overlap.
    Narrow,
}

impl ChunkingPreset {
    pub fn chunk_size(&self) -> usize {
        1000
    }

    pub fn chunk_overlap(&self) -> usize {
        match self {
            Self::Standard => 200,
            Self::Narrow => 100,
        }
    }
}

impl std::str::FromStr for ChunkingPreset {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Ok(Self::Standard),
            "narrow" => Ok(Self::Narrow),
            other => Err(Error::Config(format!(
                "unknown chunking preset '{}', expected 'standard' or 'narrow'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ChunkingPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Standard => write!(f, "standard"),
            Self::Narrow => write!(f, "narrow"),
        }
    }
}

/// Top-level DocQA configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocQaConfig {
    /// HTTP server port.
    pub port: u16,
    /// Chunking parameters applied to every upload.
    pub chunking: ChunkingPreset,
    /// Sessions kept in memory before the oldest is evicted.
    pub max_sessions: usize,
    /// Request body limit for uploads, in bytes.
    pub max_upload_bytes: usize,
}

impl Default for DocQaConfig {
    fn default() -> Self {
        Self {
            port: 3003,
            chunking: ChunkingPreset::Standard,
            max_sessions: 100,
            max_upload_bytes: 50 * 1024 * 1024,
        }
    }
}

impl DocQaConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// Create configuration from an arbitrary variable lookup.
    pub fn from_vars(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let port = match lookup("PORT") {
            Some(p) => p
                .parse()
                .map_err(|_| Error::Config(format!("PORT is not a valid port: {}", p)))?,
            None => defaults.port,
        };

        let chunking = match lookup("DOCQA_CHUNK_PRESET") {
            Some(p) => p.parse()?,
            None => defaults.chunking,
        };

        let max_sessions = match lookup("DOCQA_MAX_SESSIONS") {
            Some(v) => positive(&v, "DOCQA_MAX_SESSIONS")?,
            None => defaults.max_sessions,
        };

        let max_upload_bytes = match lookup("DOCQA_MAX_UPLOAD_MB") {
            Some(v) => positive(&v, "DOCQA_MAX_UPLOAD_MB")?
                .checked_mul(1024 * 1024)
                .ok_or_else(|| {
                    Error::Config(format!("DOCQA_MAX_UPLOAD_MB is too large: {}", v))
                })?,
            None => defaults.max_upload_bytes,
        };

        tracing::debug!(
            "Config: port={}, chunking={}, max_sessions={}",
            port,
            chunking,
            max_sessions
        );

        Ok(Self {
            port,
            chunking,
            max_sessions,
            max_upload_bytes,
        })
    }
}

fn positive(value: &str, name: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(Error::Config(format!(
            "{} must be a positive integer: {}",
            name, value
        ))),
    }
}
