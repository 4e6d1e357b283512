//! Deterministic sliding-window chunking.
//!
//! The chunker walks the extracted text with a fixed-width character window:
//! each chunk spans `[cursor, cursor + chunk_size)` (clamped to the text
//! length) and the cursor advances by `chunk_size - chunk_overlap`, so
//! consecutive chunks share exactly `chunk_overlap` characters. The walk
//! stops at the chunk that reaches the end of the text, or at `max_chunks`,
//! whichever comes first. Offsets are measured in characters, not bytes, so
//! multi-byte text chunks cleanly.

use super::types::{Chunk, ChunkingError};

use crate::config::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE, DEFAULT_MAX_CHUNKS};

/// Chunking knobs applied to every document in a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkPolicy {
    /// Maximum characters per chunk.
    pub chunk_size: usize,
    /// Characters shared between consecutive chunks.
    pub chunk_overlap: usize,
    /// Upper bound on chunks emitted per document.
    pub max_chunks: usize,
}

impl Default for ChunkPolicy {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
            max_chunks: DEFAULT_MAX_CHUNKS,
        }
    }
}

impl ChunkPolicy {
    /// Reject windows that can never advance or caps that forbid all output.
    pub fn validate(&self) -> Result<(), ChunkingError> {
        if self.chunk_size == 0 {
            return Err(ChunkingError::InvalidChunkSize);
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ChunkingError::OverlapExceedsChunkSize {
                overlap: self.chunk_overlap,
                size: self.chunk_size,
            });
        }
        if self.max_chunks == 0 {
            return Err(ChunkingError::InvalidMaxChunks);
        }
        Ok(())
    }

    fn stride(&self) -> usize {
        self.chunk_size - self.chunk_overlap
    }
}

/// Result of chunking one document.
///
/// `expected_count` is the number of chunks the walk would have produced
/// without the cap; `truncated` is set when the cap cut the sequence short,
/// so the orchestrator can surface the loss instead of hiding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkRun {
    /// Ordered chunk sequence, possibly capped.
    pub chunks: Vec<Chunk>,
    /// Chunk count the full walk would have produced.
    pub expected_count: usize,
    /// Whether `max_chunks` cut the sequence short.
    pub truncated: bool,
}

/// Split text into ordered, overlapping character windows.
///
/// Chunking is pure and deterministic: the same text and policy always
/// yield an identical sequence. Whitespace-only input yields an empty run;
/// the orchestrator intercepts that case before chunking is reached.
pub fn chunk_text(text: &str, policy: &ChunkPolicy) -> Result<ChunkRun, ChunkingError> {
    policy.validate()?;

    if text.trim().is_empty() {
        return Ok(ChunkRun {
            chunks: Vec::new(),
            expected_count: 0,
            truncated: false,
        });
    }

    // Offsets are character positions; boundaries maps them back to byte
    // offsets for slicing.
    let boundaries: Vec<usize> = text
        .char_indices()
        .map(|(offset, _)| offset)
        .chain(std::iter::once(text.len()))
        .collect();
    let total_chars = boundaries.len() - 1;

    let stride = policy.stride();
    let expected_count = if total_chars <= policy.chunk_size {
        1
    } else {
        (total_chars - policy.chunk_size).div_ceil(stride) + 1
    };

    let mut chunks = Vec::with_capacity(expected_count.min(policy.max_chunks));
    let mut cursor = 0usize;
    while cursor < total_chars && chunks.len() < policy.max_chunks {
        let end = (cursor + policy.chunk_size).min(total_chars);
        chunks.push(Chunk {
            index: chunks.len(),
            start: cursor,
            end,
            text: text[boundaries[cursor]..boundaries[end]].to_string(),
        });
        if end == total_chars {
            break;
        }
        cursor += stride;
    }

    let truncated = expected_count > chunks.len();
    Ok(ChunkRun {
        chunks,
        expected_count,
        truncated,
    })
}
