//! Overlapping text chunking

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::domain::DomainError;

/// Configuration for chunking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between consecutive chunks in characters
    pub chunk_overlap: usize,
}

impl ChunkingConfig {
    /// Create a new chunking configuration
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.chunk_size == 0 {
            return Err(DomainError::validation("chunk_size must be greater than 0"));
        }

        if self.chunk_overlap >= self.chunk_size {
            return Err(DomainError::validation(
                "chunk_overlap must be less than chunk_size",
            ));
        }

        Ok(())
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 150,
        }
    }
}

/// Metadata for a chunk, offsets in characters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    /// Index of this chunk (0-based)
    pub chunk_index: usize,
    /// Total number of chunks
    pub total_chunks: usize,
    /// Character offset where this chunk starts
    pub char_start: usize,
    /// Character offset where this chunk ends
    pub char_end: usize,
}

/// A segment of the training corpus
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Chunk content
    pub content: String,
    /// Chunk metadata
    pub metadata: ChunkMetadata,
}

impl Chunk {
    /// Content length in characters
    pub fn char_len(&self) -> usize {
        self.metadata.char_end - self.metadata.char_start
    }
}

/// Splits text into overlapping segments.
///
/// Windows are measured in characters, never bytes, so multibyte input can
/// not be cut inside a code point. Within each window the break position is
/// searched backward with paragraph, then sentence, then word preference; a
/// natural break is only taken past the window midpoint, otherwise the window
/// is cut hard at its end. The next segment starts `chunk_overlap` characters
/// before the previous break, so consecutive segments share that much text.
#[derive(Debug, Clone)]
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    pub fn new(config: ChunkingConfig) -> Result<Self, DomainError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Split text into chunks. Deterministic for identical input and config.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<(usize, char)> = text.char_indices().collect();
        let total_chars = chars.len();

        let paragraph_starts = paragraph_start_positions(&chars);
        let sentence_starts = sentence_start_positions(text, &chars);

        let slice = |from: usize, to: usize| -> &str {
            let byte_from = chars[from].0;
            let byte_to = if to == total_chars {
                text.len()
            } else {
                chars[to].0
            };
            &text[byte_from..byte_to]
        };

        let mut chunks = Vec::new();
        let mut start = 0usize;

        loop {
            let window_end = usize::min(start + self.config.chunk_size, total_chars);

            if window_end == total_chars {
                chunks.push(Chunk {
                    content: slice(start, window_end).to_string(),
                    metadata: ChunkMetadata {
                        chunk_index: chunks.len(),
                        total_chunks: 0,
                        char_start: start,
                        char_end: window_end,
                    },
                });
                break;
            }

            let midpoint = start + (window_end - start) / 2;
            let break_at = latest_in_range(&paragraph_starts, midpoint, window_end)
                .or_else(|| latest_in_range(&sentence_starts, midpoint, window_end))
                .or_else(|| latest_word_start(&chars, midpoint, window_end))
                .unwrap_or(window_end);

            chunks.push(Chunk {
                content: slice(start, break_at).to_string(),
                metadata: ChunkMetadata {
                    chunk_index: chunks.len(),
                    total_chunks: 0,
                    char_start: start,
                    char_end: break_at,
                },
            });

            start = usize::max(
                break_at.saturating_sub(self.config.chunk_overlap),
                start + 1,
            );
        }

        let total = chunks.len();
        for chunk in &mut chunks {
            chunk.metadata.total_chunks = total;
        }

        chunks
    }
}

/// Character positions where a paragraph begins after a blank line
fn paragraph_start_positions(chars: &[(usize, char)]) -> Vec<usize> {
    let mut positions = Vec::new();

    for j in 0..chars.len().saturating_sub(2) {
        if chars[j].1 == '\n' && chars[j + 1].1 == '\n' && chars[j + 2].1 != '\n' {
            positions.push(j + 2);
        }
    }

    positions
}

/// Character positions where a unicode sentence begins
fn sentence_start_positions(text: &str, chars: &[(usize, char)]) -> Vec<usize> {
    text.split_sentence_bound_indices()
        .skip(1)
        .map(|(byte, _)| byte_to_char_position(chars, byte))
        .collect()
}

fn byte_to_char_position(chars: &[(usize, char)], byte: usize) -> usize {
    chars.partition_point(|(b, _)| *b < byte)
}

/// Largest break position with `after < position <= upto`
fn latest_in_range(positions: &[usize], after: usize, upto: usize) -> Option<usize> {
    let idx = positions.partition_point(|&p| p <= upto);
    if idx == 0 {
        return None;
    }

    let candidate = positions[idx - 1];
    (candidate > after).then_some(candidate)
}

/// Largest position in `(after, upto]` where a word starts after whitespace
fn latest_word_start(chars: &[(usize, char)], after: usize, upto: usize) -> Option<usize> {
    let mut pos = upto;

    while pos > after {
        let prev_is_space = chars[pos - 1].1.is_whitespace();
        let here_is_word = chars
            .get(pos)
            .map(|(_, c)| !c.is_whitespace())
            .unwrap_or(false);

        if prev_is_space && here_is_word {
            return Some(pos);
        }

        pos -= 1;
    }

    None
}
