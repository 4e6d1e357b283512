//! Shared types used by the Qdrant client.

use crate::pipeline::EmbeddedChunk;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors returned while interacting with Qdrant.
#[derive(Debug, Error)]
pub enum QdrantError {
    /// Base URL failed to parse or normalize.
    #[error("Invalid Qdrant URL: {0}")]
    InvalidUrl(String),
    /// HTTP layer failed before receiving a response.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Qdrant responded with an unexpected status code.
    #[error("Unexpected Qdrant response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Qdrant.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// Acknowledgment returned after a document's embeddings are upserted.
///
/// Treated as an opaque value by the pipeline: it is produced by the writer
/// and handed back to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageResult {
    /// Collection that received the points.
    pub collection: String,
    /// Number of points written by the upsert.
    pub points_written: usize,
}

/// Seam between the pipeline and the vector store.
#[async_trait]
pub trait VectorStoreWriter: Send + Sync {
    /// Upsert the full embedded-chunk set for one document in a single call.
    async fn store_embeddings(
        &self,
        embedded: &[EmbeddedChunk],
    ) -> Result<StorageResult, QdrantError>;
}
