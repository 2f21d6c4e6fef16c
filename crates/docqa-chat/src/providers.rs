//! Streaming completion client.
//!
//! Azure OpenAI and OpenAI share the same SSE wire format and differ only in
//! URL layout and auth header.

use std::pin::Pin;
use std::time::Duration;

use docqa_core::{Error, Result};
use futures::Stream;
use reqwest::Client;
use serde_json::json;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::config::{CompletionConfig, Provider};
use crate::types::ChatMessage;

/// Boxed stream type for returning different stream implementations.
pub type BoxedStream = Pin<Box<dyn Stream<Item = StreamChunk> + Send>>;

/// A single streamed token, the end marker, or a failure.
///
/// `Error` is always the last item of a stream.
#[derive(Debug)]
pub enum StreamChunk {
    Token(String),
    Done { tokens_used: usize },
    Error(Error),
}

/// Remote chat completion service.
pub trait CompletionClient: Send + Sync {
    /// Stream the answer to `transcript`, with `system_context` sent as the
    /// leading system message.
    fn complete(&self, system_context: &str, transcript: &[ChatMessage]) -> BoxedStream;

    /// Model (or deployment) name reported to clients.
    fn model(&self) -> &str;
}

/// Build the request message list: system context first, then the
/// transcript as role + content pairs.
pub fn request_messages(system_context: &str, transcript: &[ChatMessage]) -> Vec<serde_json::Value> {
    std::iter::once(json!({"role": "system", "content": system_context}))
        .chain(
            transcript
                .iter()
                .map(|m| json!({"role": m.role, "content": m.content})),
        )
        .collect()
}

/// Map a non-success HTTP status to an error kind.
pub fn status_error(status: u16, body: &str) -> Error {
    match status {
        401 | 403 => Error::Auth(format!("API returned {}: {}", status, body)),
        429 => Error::RateLimit(format!("API returned {}: {}", status, body)),
        _ => Error::Transport(format!("API error {}: {}", status, body)),
    }
}

/// HTTP client for OpenAI-compatible chat completion endpoints.
#[derive(Clone)]
pub struct HttpCompletionClient {
    client: Client,
    config: CompletionConfig,
}

impl HttpCompletionClient {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &CompletionConfig {
        &self.config
    }
}

impl CompletionClient for HttpCompletionClient {
    fn complete(&self, system_context: &str, transcript: &[ChatMessage]) -> BoxedStream {
        Box::pin(stream_chat_completion(
            self.client.clone(),
            self.config.clone(),
            request_messages(system_context, transcript),
        ))
    }

    fn model(&self) -> &str {
        &self.config.model
    }
}

fn stream_chat_completion(
    client: Client,
    config: CompletionConfig,
    messages: Vec<serde_json::Value>,
) -> impl Stream<Item = StreamChunk> + Send + 'static {
    let url = config.chat_url();

    async_stream::stream! {
        let body = json!({
            "model": config.model,
            "messages": messages,
            "temperature": config.temperature,
            "stream": true,
        });

        debug!("Streaming from {} with model {}", config.provider, config.model);

        let request = client.post(&url).header("Content-Type", "application/json");
        let request = match config.provider {
            Provider::Azure => request.header("api-key", &config.api_key),
            Provider::OpenAI => request.header("Authorization", format!("Bearer {}", config.api_key)),
        };

        let response = match request.json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                yield StreamChunk::Error(Error::Transport(format!("Request failed: {}", e)));
                return;
            }
        };

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("Completion request rejected with status {}", status);
            yield StreamChunk::Error(status_error(status, &body));
            return;
        }

        let mut stream = response.bytes_stream();
        let mut decoder = SseDecoder::default();
        let mut token_count = 0usize;

        while let Some(chunk) = stream.next().await {
            let bytes = match chunk {
                Ok(b) => b,
                Err(e) => {
                    yield StreamChunk::Error(Error::Transport(format!("Stream read error: {}", e)));
                    return;
                }
            };

            for data in decoder.push(&bytes) {
                match data {
                    SseData::Token(content) => {
                        token_count += 1;
                        yield StreamChunk::Token(content);
                    }
                    SseData::Done => {
                        yield StreamChunk::Done { tokens_used: token_count };
                        return;
                    }
                    SseData::Error(message) => {
                        yield StreamChunk::Error(Error::Transport(message));
                        return;
                    }
                }
            }
        }

        match decoder.finish() {
            Some(SseData::Token(content)) => {
                token_count += 1;
                yield StreamChunk::Token(content);
            }
            Some(SseData::Error(message)) => {
                yield StreamChunk::Error(Error::Transport(message));
                return;
            }
            Some(SseData::Done) | None => {}
        }

        yield StreamChunk::Done { tokens_used: token_count };
    }
}

/// Payload of one SSE `data:` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseData {
    Token(String),
    Done,
    Error(String),
}

/// Incremental SSE line decoder.
///
/// Buffers raw bytes so that lines and multi-byte characters split across
/// network chunks are decoded intact.
#[derive(Debug, Default)]
pub struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    /// Feed bytes, returning the payloads of every completed line.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<SseData> {
        self.buffer.extend_from_slice(bytes);

        let mut out = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            if let Some(data) = parse_line(&String::from_utf8_lossy(&line)) {
                out.push(data);
            }
        }
        out
    }

    /// Decode whatever is left once the body ends without a trailing newline.
    pub fn finish(&mut self) -> Option<SseData> {
        let rest = std::mem::take(&mut self.buffer);
        parse_line(&String::from_utf8_lossy(&rest))
    }
}

fn parse_line(line: &str) -> Option<SseData> {
    let line = line.trim();
    if line.is_empty() || line.starts_with(':') {
        return None;
    }

    let data = line.strip_prefix("data:")?.trim();
    if data == "[DONE]" {
        return Some(SseData::Done);
    }

    let parsed: serde_json::Value = serde_json::from_str(data).ok()?;
    if let Some(message) = parsed["error"]["message"].as_str() {
        return Some(SseData::Error(message.to_string()));
    }

    // Azure sends a leading chunk with empty `choices` (content filter results).
    let content = parsed["choices"][0]["delta"]["content"].as_str()?;
    if content.is_empty() {
        None
    } else {
        Some(SseData::Token(content.to_string()))
    }
}
