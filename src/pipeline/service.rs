//! Pipeline orchestrator sequencing extraction, chunking, embedding, and storage.

use crate::{
    config::get_config,
    embedding::{EmbeddingClient, get_embedding_client},
    extract::{TextExtractor, get_text_extractor},
    metrics::{IngestMetrics, MetricsSnapshot},
    pipeline::{
        chunking::{ChunkPolicy, chunk_text},
        embedder::ChunkEmbedder,
        types::{DocumentProvenance, PipelineError, PipelineOutcome},
    },
    qdrant::{QdrantError, QdrantService, VectorStoreWriter},
};
use std::path::Path;
use std::sync::Arc;

/// Fixed diagnostic returned when extraction yields no usable text.
pub const NO_CONTENT_MESSAGE: &str =
    "No extractable text found. This PDF may be scanned or image-based. Consider OCR.";

/// Fixed diagnostic returned when the embedding provider yields no vectors.
pub const EMBEDDING_EMPTY_MESSAGE: &str = "Embedding failed. No embeddings were returned.";

/// Coordinates the full ingestion pipeline for uploaded documents.
///
/// The pipeline owns long-lived handles to the extractor, embedding client,
/// and vector store writer. Construct it once near process start and share
/// it through an `Arc`; each invocation is independent and carries no state
/// across documents.
pub struct IngestPipeline {
    extractor: Box<dyn TextExtractor + Send + Sync>,
    embedder: ChunkEmbedder,
    writer: Box<dyn VectorStoreWriter + Send + Sync>,
    policy: ChunkPolicy,
    metrics: Arc<IngestMetrics>,
}

impl IngestPipeline {
    /// Build a pipeline from the loaded configuration, bootstrapping the
    /// target collection and its payload indexes.
    pub async fn new() -> Result<Self, QdrantError> {
        let config = get_config();
        tracing::info!("Initializing embedding client");
        let embedding_client = get_embedding_client();
        let qdrant_service = QdrantService::new()?;
        let vector_size = config.embedding_dimension as u64;
        tracing::debug!(
            collection = %config.qdrant_collection_name,
            vector_size,
            "Ensuring chunk collection"
        );
        qdrant_service
            .create_collection_if_not_exists(vector_size)
            .await?;
        qdrant_service.ensure_payload_indexes().await?;
        tracing::debug!(collection = %config.qdrant_collection_name, "Chunk collection ready");

        Ok(Self::from_parts(
            get_text_extractor(),
            embedding_client,
            Box::new(qdrant_service),
            config.chunk_policy(),
            config.embedding_batch_size,
        ))
    }

    /// Assemble a pipeline from explicit collaborators.
    ///
    /// The seam used by tests and by callers that bring their own extractor,
    /// embedding backend, or store.
    pub fn from_parts(
        extractor: Box<dyn TextExtractor + Send + Sync>,
        embedding_client: Box<dyn EmbeddingClient + Send + Sync>,
        writer: Box<dyn VectorStoreWriter + Send + Sync>,
        policy: ChunkPolicy,
        embedding_batch_size: usize,
    ) -> Self {
        Self {
            extractor,
            embedder: ChunkEmbedder::new(embedding_client, embedding_batch_size),
            writer,
            policy,
            metrics: Arc::new(IngestMetrics::new()),
        }
    }

    /// Run the full pipeline for one uploaded document.
    ///
    /// The flow is strictly linear: extract, chunk, embed, store. Content
    /// absence and embedding emptiness come back as [`PipelineOutcome`]
    /// variants; anything unexpected is a stage-tagged [`PipelineError`].
    /// There are no internal retries; a failed run is re-driven from the
    /// start by the caller.
    pub async fn ingest_document(
        &self,
        tmp_path: &Path,
        filename: &str,
        user_id: &str,
        doc_id: &str,
        doc_type: &str,
    ) -> Result<PipelineOutcome, PipelineError> {
        let extension = file_extension(filename);
        tracing::info!(doc_id, filename, extension = %extension, "Processing document");

        let extracted_text = self.extractor.extract(tmp_path, &extension).await?;

        if extracted_text.trim().is_empty() {
            tracing::info!(doc_id, "Document produced no extractable text");
            return Ok(PipelineOutcome::NoContent {
                extracted_text: None,
                chunks: Vec::new(),
                chunk_count: 0,
                embeddings: Vec::new(),
                error: NO_CONTENT_MESSAGE.to_string(),
            });
        }

        let run = chunk_text(&extracted_text, &self.policy)?;
        if run.truncated {
            self.metrics.record_truncation();
            tracing::warn!(
                doc_id,
                expected = run.expected_count,
                actual = run.chunks.len(),
                max_chunks = self.policy.max_chunks,
                "Chunk sequence truncated at cap"
            );
        }

        let provenance = DocumentProvenance {
            user_id: user_id.to_string(),
            doc_id: doc_id.to_string(),
            doc_type: doc_type.to_string(),
        };
        let embedded = self.embedder.embed_chunks(&run.chunks, &provenance).await?;

        if embedded.is_empty() {
            tracing::warn!(doc_id, chunks = run.chunks.len(), "No embeddings returned");
            return Ok(PipelineOutcome::EmbeddingEmpty {
                error: EMBEDDING_EMPTY_MESSAGE.to_string(),
            });
        }

        let storage_result = self.writer.store_embeddings(&embedded).await?;

        self.metrics.record_document(embedded.len() as u64);
        tracing::info!(
            doc_id,
            chunks = embedded.len(),
            collection = %storage_result.collection,
            points = storage_result.points_written,
            "Document stored"
        );

        Ok(PipelineOutcome::Stored { storage_result })
    }

    /// Return the current ingestion metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

/// Lowercased extension of an uploaded filename, without the dot.
fn file_extension(filename: &str) -> String {
    filename
        .rsplit_once('.')
        .map(|(_, extension)| extension.to_ascii_lowercase())
        .unwrap_or_default()
}
