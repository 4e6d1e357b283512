//! Document ingestion pipeline: chunking, embedding orchestration, and storage.

pub mod chunking;
mod embedder;
mod service;
pub mod types;

pub use chunking::{ChunkPolicy, ChunkRun, chunk_text};
pub use embedder::ChunkEmbedder;
pub use service::{EMBEDDING_EMPTY_MESSAGE, IngestPipeline, NO_CONTENT_MESSAGE};
pub use types::{
    Chunk, ChunkingError, DocumentProvenance, EmbeddedChunk, PipelineError, PipelineOutcome,
    PipelineStage,
};
