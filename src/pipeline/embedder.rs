//! Batching and provenance-tagging layer over the embedding client.

use crate::embedding::{EmbeddingClient, EmbeddingClientError};
use crate::pipeline::types::{Chunk, DocumentProvenance, EmbeddedChunk};

/// Turns a document's chunk sequence into provenance-tagged vectors.
///
/// The underlying client sees plain batches of text; this layer owns the
/// contract that every returned vector can be traced back to its chunk
/// index, document, user, and document type, regardless of batching.
pub struct ChunkEmbedder {
    client: Box<dyn EmbeddingClient + Send + Sync>,
    batch_size: usize,
}

impl ChunkEmbedder {
    /// Wrap an embedding client, submitting at most `batch_size` texts per call.
    pub fn new(client: Box<dyn EmbeddingClient + Send + Sync>, batch_size: usize) -> Self {
        Self {
            client,
            batch_size: batch_size.max(1),
        }
    }

    /// Embed every chunk, tagging each vector with its provenance.
    ///
    /// Returns an empty vector when the provider produces nothing for a
    /// batch: the pipeline treats that as a total embedding failure with no
    /// partial results. A non-empty response that does not line up
    /// one-to-one with its batch is a [`EmbeddingClientError::CountMismatch`].
    pub async fn embed_chunks(
        &self,
        chunks: &[Chunk],
        provenance: &DocumentProvenance,
    ) -> Result<Vec<EmbeddedChunk>, EmbeddingClientError> {
        let mut embedded = Vec::with_capacity(chunks.len());

        for batch in chunks.chunks(self.batch_size) {
            let texts: Vec<String> = batch.iter().map(|chunk| chunk.text.clone()).collect();
            let vectors = self.client.generate_embeddings(texts).await?;

            if vectors.is_empty() {
                tracing::warn!(
                    doc_id = %provenance.doc_id,
                    batch = batch.len(),
                    "Embedding provider returned no vectors"
                );
                return Ok(Vec::new());
            }
            if vectors.len() != batch.len() {
                return Err(EmbeddingClientError::CountMismatch {
                    expected: batch.len(),
                    actual: vectors.len(),
                });
            }

            for (chunk, vector) in batch.iter().zip(vectors) {
                embedded.push(EmbeddedChunk {
                    chunk: chunk.clone(),
                    vector,
                    provenance: provenance.clone(),
                });
            }
        }

        Ok(embedded)
    }
}
