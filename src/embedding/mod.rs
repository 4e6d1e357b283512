//! Embedding client abstraction and adapters.
//!
//! The pipeline treats embedding generation as an external collaborator: it
//! hands over a batch of chunk texts and expects one vector per text, in
//! order. Two adapters are provided: an OpenAI-compatible HTTP client and a
//! deterministic hashing client that works offline.

use crate::config::{EmbeddingProvider, get_config};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingClientError {
    /// Provider was unable to produce embeddings for the supplied input.
    #[error("Failed to generate embeddings: {0}")]
    GenerationFailed(String),
    /// HTTP layer failed before a response was produced.
    #[error("Embedding request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider returned a non-empty result that does not line up with the input.
    #[error("Embedding count mismatch: expected {expected}, got {actual}")]
    CountMismatch {
        /// Number of texts submitted in the request.
        expected: usize,
        /// Number of vectors returned by the provider.
        actual: usize,
    },
}

/// Interface implemented by embedding backends.
#[async_trait]
pub trait EmbeddingClient: Send + Sync {
    /// Produce an embedding vector for each supplied chunk of text, in input order.
    ///
    /// An empty result signals that the provider produced nothing for the
    /// whole batch; callers treat that as a total failure rather than a
    /// partial one.
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError>;
}

/// Deterministic embedding client hashing text content into unit vectors.
///
/// Useful for offline development and tests: identical text always maps to
/// an identical vector of the configured dimension.
pub struct DeterministicEmbeddingClient {
    dimension: usize,
}

impl DeterministicEmbeddingClient {
    /// Construct a client emitting vectors of `dimension` components.
    pub const fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn encode(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0_f32; self.dimension];

        if text.is_empty() {
            return embedding;
        }

        for (idx, byte) in text.bytes().enumerate() {
            let position = idx % self.dimension;
            embedding[position] += f32::from(byte) / 255.0;
        }

        let norm = embedding
            .iter()
            .map(|value| value * value)
            .sum::<f32>()
            .sqrt();

        if norm > 0.0 {
            for value in &mut embedding {
                *value /= norm;
            }
        }

        embedding
    }
}

#[async_trait]
impl EmbeddingClient for DeterministicEmbeddingClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        if self.dimension == 0 {
            return Err(EmbeddingClientError::GenerationFailed(
                "embedding dimension must be greater than zero".to_string(),
            ));
        }

        tracing::debug!(texts = texts.len(), dimension = self.dimension, "Encoding deterministic embeddings");
        Ok(texts.iter().map(|text| self.encode(text)).collect())
    }
}

/// Embedding client for OpenAI-compatible `/embeddings` endpoints.
pub struct OpenAiEmbeddingClient {
    http: Client,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingDatum {
    index: usize,
    embedding: Vec<f32>,
}

impl OpenAiEmbeddingClient {
    /// Construct a client for the given endpoint, model, and timeout.
    pub fn new(
        base_url: String,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Self {
        let http = Client::builder()
            .user_agent("mcq-ingest/embeddings")
            .timeout(timeout)
            .build()
            .expect("Failed to construct reqwest::Client for embeddings");
        Self {
            http,
            base_url,
            api_key,
            model,
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/embeddings", self.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbeddingClient {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingClientError> {
        let expected = texts.len();
        let payload = json!({
            "model": self.model,
            "input": texts,
        });

        let mut request = self.http.post(self.endpoint()).json(&payload);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingClientError::GenerationFailed(format!(
                "embedding service returned {status}: {body}"
            )));
        }

        let body: EmbeddingsResponse = response.json().await?;
        let mut data = body.data;
        data.sort_by_key(|datum| datum.index);
        let vectors: Vec<Vec<f32>> = data.into_iter().map(|datum| datum.embedding).collect();

        // Empty means the provider produced nothing; that decision belongs
        // to the caller. Anything else must match the input one-to-one.
        if !vectors.is_empty() && vectors.len() != expected {
            return Err(EmbeddingClientError::CountMismatch {
                expected,
                actual: vectors.len(),
            });
        }

        Ok(vectors)
    }
}

/// Build an embedding client suitable for the current configuration.
pub fn get_embedding_client() -> Box<dyn EmbeddingClient + Send + Sync> {
    let config = get_config();
    match config.embedding_provider {
        EmbeddingProvider::Deterministic => {
            Box::new(DeterministicEmbeddingClient::new(config.embedding_dimension))
        }
        EmbeddingProvider::OpenAI => {
            let base_url = config
                .embedding_url
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string());
            Box::new(OpenAiEmbeddingClient::new(
                base_url,
                config.embedding_api_key.clone(),
                config.embedding_model.clone(),
                Duration::from_secs(config.request_timeout_secs),
            ))
        }
    }
}
