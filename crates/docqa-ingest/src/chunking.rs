//! Recursive character chunking.
//!
//! Text is split on the coarsest separator it contains (paragraph, line,
//! sentence, word, then individual characters). Pieces that are still too
//! large are split again with the finer separators; small pieces are merged
//! back into chunks of at most `chunk_size` characters, with up to
//! `chunk_overlap` characters of trailing pieces repeated at the start of the
//! next chunk. All sizes count characters, not bytes.
//!
//! Each piece keeps the separator that ended it, so merging is plain
//! concatenation and only whitespace at chunk edges is ever dropped.

use std::collections::VecDeque;

use docqa_core::{ChunkingPreset, Error, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Separator ladder, coarsest first. The empty separator splits into characters.
pub const DEFAULT_SEPARATORS: &[&str] = &["\n\n", "\n", ". ", " ", ""];

/// A bounded piece of a source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub text: String,
    pub source_name: String,
}

/// Recursive chunker that respects document structure.
#[derive(Debug, Clone)]
pub struct RecursiveChunker {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    separators: Vec<&'static str>,
}

impl RecursiveChunker {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::Config("chunk size must be positive".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(Error::Config(format!(
                "chunk overlap ({}) must be smaller than chunk size ({})",
                chunk_overlap, chunk_size
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
            separators: DEFAULT_SEPARATORS.to_vec(),
        })
    }

    pub fn from_preset(preset: ChunkingPreset) -> Self {
        Self {
            chunk_size: preset.chunk_size(),
            chunk_overlap: preset.chunk_overlap(),
            separators: DEFAULT_SEPARATORS.to_vec(),
        }
    }

    /// Lazily split `text` into chunks. Calling again restarts from the top
    /// and yields the same sequence.
    pub fn split<'a>(&'a self, text: &'a str) -> Chunks<'a> {
        Chunks::new(self, text)
    }

    /// Split a document, tagging each chunk with its source name.
    pub fn split_document<'a>(
        &'a self,
        source_name: &'a str,
        text: &'a str,
    ) -> impl Iterator<Item = Chunk> + 'a {
        self.split(text).map(move |text| Chunk {
            text,
            source_name: source_name.to_string(),
        })
    }

    /// Greedily merge small pieces into chunks, carrying overlap forward.
    fn merge_pieces(&self, pieces: &[&str]) -> Vec<String> {
        let mut chunks = Vec::new();
        let mut current: VecDeque<&str> = VecDeque::new();
        let mut total = 0usize;

        for &piece in pieces {
            let len = char_len(piece);

            if total + len > self.chunk_size {
                if total > self.chunk_size {
                    warn!(
                        "Created a chunk of {} chars, longer than the limit of {}",
                        total, self.chunk_size
                    );
                }
                if !current.is_empty() {
                    if let Some(chunk) = join_trimmed(&current) {
                        chunks.push(chunk);
                    }
                    // Drop leading pieces until only the overlap remains and
                    // the incoming piece fits.
                    while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size)
                    {
                        let dropped = match current.pop_front() {
                            Some(first) => first,
                            None => break,
                        };
                        total = total.saturating_sub(char_len(dropped));
                    }
                }
            }

            current.push_back(piece);
            total += len;
        }

        if let Some(chunk) = join_trimmed(&current) {
            chunks.push(chunk);
        }
        chunks
    }
}

impl Default for RecursiveChunker {
    fn default() -> Self {
        Self::from_preset(ChunkingPreset::default())
    }
}

/// Iterator over the chunks of one text, produced on demand.
pub struct Chunks<'a> {
    chunker: &'a RecursiveChunker,
    whole: Option<&'a str>,
    frames: Vec<Frame<'a>>,
    ready: VecDeque<String>,
}

/// One level of the recursive split: the pieces of a text cut after each
/// occurrence of one separator.
struct Frame<'a> {
    pieces: std::vec::IntoIter<&'a str>,
    /// Index of the next finer separator, if any remain.
    finer: Option<usize>,
    /// Small pieces waiting to be merged.
    pending: Vec<&'a str>,
}

enum Step<'a> {
    Oversized {
        pending: Vec<&'a str>,
        finer: Option<usize>,
        piece: &'a str,
    },
    Exhausted,
}

impl<'a> Frame<'a> {
    fn new(text: &'a str, separators: &[&'static str], start: usize) -> Self {
        let mut separator = separators.last().copied().unwrap_or("");
        let mut finer = None;

        for (i, &sep) in separators.iter().enumerate().skip(start) {
            if sep.is_empty() {
                separator = sep;
                finer = None;
                break;
            }
            if text.contains(sep) {
                separator = sep;
                finer = (i + 1 < separators.len()).then_some(i + 1);
                break;
            }
        }

        let pieces: Vec<&'a str> = if separator.is_empty() {
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()])
                .collect()
        } else {
            text.split_inclusive(separator).collect()
        };

        Self {
            pieces: pieces.into_iter(),
            finer,
            pending: Vec::new(),
        }
    }
}

impl<'a> Chunks<'a> {
    fn new(chunker: &'a RecursiveChunker, text: &'a str) -> Self {
        let (whole, frames) = if char_len(text) <= chunker.chunk_size {
            (Some(text), Vec::new())
        } else {
            (None, vec![Frame::new(text, &chunker.separators, 0)])
        };
        Self {
            chunker,
            whole,
            frames,
            ready: VecDeque::new(),
        }
    }
}

impl<'a> Iterator for Chunks<'a> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            if let Some(chunk) = self.ready.pop_front() {
                return Some(chunk);
            }
            if let Some(text) = self.whole.take() {
                return Some(text.to_string());
            }

            let step = {
                let frame = self.frames.last_mut()?;
                match frame.pieces.next() {
                    Some(piece) if char_len(piece) < self.chunker.chunk_size => {
                        frame.pending.push(piece);
                        continue;
                    }
                    Some(piece) => Step::Oversized {
                        pending: std::mem::take(&mut frame.pending),
                        finer: frame.finer,
                        piece,
                    },
                    None => Step::Exhausted,
                }
            };

            match step {
                Step::Oversized {
                    pending,
                    finer,
                    piece,
                } => {
                    self.ready.extend(self.chunker.merge_pieces(&pending));
                    match finer {
                        Some(start) => self
                            .frames
                            .push(Frame::new(piece, &self.chunker.separators, start)),
                        None => {
                            let trimmed = piece.trim();
                            if !trimmed.is_empty() {
                                self.ready.push_back(trimmed.to_string());
                            }
                        }
                    }
                }
                Step::Exhausted => {
                    if let Some(frame) = self.frames.pop() {
                        self.ready.extend(self.chunker.merge_pieces(&frame.pending));
                    }
                }
            }
        }
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

fn join_trimmed(pieces: &VecDeque<&str>) -> Option<String> {
    let joined: String = pieces.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
