//! Core data types and error definitions for the ingestion pipeline.

use crate::embedding::EmbeddingClientError;
use crate::extract::ExtractionError;
use crate::qdrant::{QdrantError, StorageResult};
use serde::Serialize;
use thiserror::Error;

/// Errors produced while turning raw text into chunks.
///
/// All variants describe impossible chunking knobs; they surface at
/// configuration load and again defensively at the chunking call site.
#[derive(Debug, Error)]
pub enum ChunkingError {
    /// A zero-width chunk window was requested.
    #[error("chunk size must be greater than zero")]
    InvalidChunkSize,
    /// The window would never advance past the overlap.
    #[error("chunk overlap ({overlap}) must be smaller than chunk size ({size})")]
    OverlapExceedsChunkSize {
        /// Configured overlap in characters.
        overlap: usize,
        /// Configured chunk size in characters.
        size: usize,
    },
    /// A zero-chunk cap would make every document unembeddable.
    #[error("max chunks must be greater than zero")]
    InvalidMaxChunks,
}

/// One bounded window of a document's extracted text.
///
/// `start` and `end` are character offsets into the extracted text, with
/// `text` equal to the `[start, end)` slice. Chunks are 0-indexed in
/// document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position of this chunk within the document's chunk sequence.
    pub index: usize,
    /// Inclusive character offset where the chunk begins.
    pub start: usize,
    /// Exclusive character offset where the chunk ends.
    pub end: usize,
    /// The chunk's text content.
    pub text: String,
}

/// Ownership tags attached to every vector produced for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentProvenance {
    /// Owner of the uploaded document.
    pub user_id: String,
    /// Opaque identifier of the ingested document.
    pub doc_id: String,
    /// Tag describing the document's downstream use, e.g. `mcq`.
    pub doc_type: String,
}

/// A chunk paired with its embedding vector and provenance tags.
///
/// Produced exactly once per surviving chunk and never mutated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct EmbeddedChunk {
    /// The originating chunk.
    pub chunk: Chunk,
    /// Fixed-dimension vector produced by the embedding provider.
    pub vector: Vec<f32>,
    /// Tags tracing the vector back to its document and owner.
    pub provenance: DocumentProvenance,
}

/// Terminal output of one pipeline invocation.
///
/// Recognized non-success outcomes (`NoContent`, `EmbeddingEmpty`) are data,
/// not errors: callers can branch on them without unwinding. Exactly one
/// outcome is produced per invocation.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PipelineOutcome {
    /// All stages succeeded; the writer's acknowledgment is passed through verbatim.
    Stored {
        /// Acknowledgment returned by the vector store.
        storage_result: StorageResult,
    },
    /// Extraction produced no usable text. The document likely needs OCR.
    NoContent {
        /// Always `None`: nothing was extracted.
        extracted_text: Option<String>,
        /// Always empty.
        chunks: Vec<Chunk>,
        /// Always zero.
        chunk_count: usize,
        /// Always empty.
        embeddings: Vec<EmbeddedChunk>,
        /// Fixed diagnostic suggesting OCR.
        error: String,
    },
    /// The embedding provider returned no vectors for the document's chunks.
    EmbeddingEmpty {
        /// Fixed diagnostic for the caller.
        error: String,
    },
}

/// Pipeline stages used to tag faults.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    /// Text extraction from the uploaded file.
    Extraction,
    /// Splitting extracted text into chunks.
    Chunking,
    /// Vector generation for the chunk sequence.
    Embedding,
    /// Upsert into the vector store.
    Storage,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Extraction => "extraction",
            Self::Chunking => "chunking",
            Self::Embedding => "embedding",
            Self::Storage => "storage",
        };
        f.write_str(name)
    }
}

/// Fatal faults emitted by the ingestion pipeline.
///
/// Each variant tags the stage that failed and wraps the underlying cause,
/// so callers can branch programmatically instead of parsing messages. The
/// rendered message keeps the historical `[MCQ Pipeline] Failed:` prefix.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Extraction raised an unexpected fault.
    #[error("[MCQ Pipeline] Failed: extraction stage: {0}")]
    Extraction(#[from] ExtractionError),
    /// Chunking was invoked with an impossible configuration.
    #[error("[MCQ Pipeline] Failed: chunking stage: {0}")]
    Chunking(#[from] ChunkingError),
    /// The embedding client raised an unexpected fault.
    #[error("[MCQ Pipeline] Failed: embedding stage: {0}")]
    Embedding(#[from] EmbeddingClientError),
    /// The vector store raised an unexpected fault.
    #[error("[MCQ Pipeline] Failed: storage stage: {0}")]
    Storage(#[from] QdrantError),
}

impl PipelineError {
    /// The stage where the fault occurred.
    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::Extraction(_) => PipelineStage::Extraction,
            Self::Chunking(_) => PipelineStage::Chunking,
            Self::Embedding(_) => PipelineStage::Embedding,
            Self::Storage(_) => PipelineStage::Storage,
        }
    }
}
