//! HTTP client wrapper for interacting with Qdrant.

use crate::config::get_config;
use crate::pipeline::EmbeddedChunk;
use crate::qdrant::{
    payload::{build_payload, current_timestamp_rfc3339, deterministic_point_id},
    types::{QdrantError, StorageResult, VectorStoreWriter},
};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::json;
use std::time::Duration;

/// Lightweight HTTP client for Qdrant operations.
pub struct QdrantService {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: Option<String>,
    pub(crate) collection: String,
}

impl QdrantService {
    /// Construct a new client using configuration derived from the environment.
    pub fn new() -> Result<Self, QdrantError> {
        let config = get_config();
        let client = Client::builder()
            .user_agent("mcq-ingest/0.1")
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        let base_url = normalize_base_url(&config.qdrant_url).map_err(QdrantError::InvalidUrl)?;
        tracing::debug!(
            url = %base_url,
            collection = %config.qdrant_collection_name,
            has_api_key = %config
                .qdrant_api_key
                .as_deref()
                .map(|value| !value.is_empty())
                .unwrap_or(false),
            "Initialized Qdrant HTTP client"
        );

        Ok(Self {
            client,
            base_url,
            api_key: config.qdrant_api_key.clone(),
            collection: config.qdrant_collection_name.clone(),
        })
    }

    /// Create the target collection only when it is missing from Qdrant.
    pub async fn create_collection_if_not_exists(
        &self,
        vector_size: u64,
    ) -> Result<(), QdrantError> {
        if self.collection_exists().await? {
            return Ok(());
        }

        tracing::debug!(
            collection = %self.collection,
            vector_size,
            "Creating collection"
        );
        self.create_collection(vector_size).await
    }

    /// Create or update the target collection with the specified vector size.
    pub async fn create_collection(&self, vector_size: u64) -> Result<(), QdrantError> {
        let body = json!({
            "vectors": {
                "size": vector_size,
                "distance": "Cosine"
            }
        });

        let response = self
            .request(Method::PUT, &format!("collections/{}", self.collection))?
            .json(&body)
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(collection = %self.collection, "Collection ensured/created");
        })
        .await
    }

    /// Ensure payload indexes exist for the provenance fields used in filters.
    pub async fn ensure_payload_indexes(&self) -> Result<(), QdrantError> {
        let fields: [(&str, &str); 5] = [
            ("user_id", "keyword"),
            ("doc_id", "keyword"),
            ("doc_type", "keyword"),
            ("chunk_index", "integer"),
            ("timestamp", "datetime"),
        ];

        for (field, schema) in fields {
            let body = json!({
                "field_name": field,
                "field_schema": schema,
            });

            let response = self
                .request(Method::PUT, &format!("collections/{}/index", self.collection))?
                .json(&body)
                .send()
                .await?;

            if response.status().is_success() {
                tracing::debug!(
                    collection = %self.collection,
                    field,
                    schema,
                    "Payload index ensured"
                );
            } else if response.status() == StatusCode::CONFLICT {
                tracing::debug!(
                    collection = %self.collection,
                    field,
                    schema,
                    "Payload index already exists"
                );
            } else {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                let error = QdrantError::UnexpectedStatus { status, body };
                tracing::warn!(collection = %self.collection, field, schema, error = %error, "Failed to ensure payload index");
            }
        }

        Ok(())
    }

    /// Upsert a document's embedded chunks into the target collection.
    ///
    /// Point identifiers are derived from `(doc_id, chunk_index)`, so
    /// repeating the call for the same document replaces its points in place.
    pub async fn upsert_embeddings(
        &self,
        embedded: &[EmbeddedChunk],
    ) -> Result<StorageResult, QdrantError> {
        if embedded.is_empty() {
            return Ok(StorageResult {
                collection: self.collection.clone(),
                points_written: 0,
            });
        }

        let now = current_timestamp_rfc3339();
        let serialized: Vec<_> = embedded
            .iter()
            .map(|item| {
                json!({
                    "id": deterministic_point_id(&item.provenance.doc_id, item.chunk.index),
                    "vector": item.vector,
                    "payload": build_payload(item, &now),
                })
            })
            .collect();

        let point_count = serialized.len();
        let response = self
            .request(Method::PUT, &format!("collections/{}/points", self.collection))?
            .query(&[("wait", true)])
            .json(&json!({ "points": serialized }))
            .send()
            .await?;

        self.ensure_success(response, || {
            tracing::debug!(
                collection = %self.collection,
                points = point_count,
                "Points upserted"
            );
        })
        .await?;

        Ok(StorageResult {
            collection: self.collection.clone(),
            points_written: point_count,
        })
    }

    async fn collection_exists(&self) -> Result<bool, QdrantError> {
        let response = self
            .request(Method::GET, &format!("collections/{}", self.collection))?
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            status => {
                let body = response.text().await.unwrap_or_default();
                let error = QdrantError::UnexpectedStatus { status, body };
                tracing::error!(collection = %self.collection, error = %error, "Collection existence check failed");
                Err(error)
            }
        }
    }

    fn request(&self, method: Method, path: &str) -> Result<reqwest::RequestBuilder, QdrantError> {
        let url = format_endpoint(&self.base_url, path);
        let mut req = self.client.request(method, url);
        if let Some(api_key) = &self.api_key
            && !api_key.is_empty()
        {
            req = req.header("api-key", api_key);
        }
        Ok(req)
    }

    async fn ensure_success<F>(
        &self,
        response: reqwest::Response,
        on_success: F,
    ) -> Result<(), QdrantError>
    where
        F: FnOnce(),
    {
        if response.status().is_success() {
            on_success();
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = QdrantError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Qdrant request failed");
            Err(error)
        }
    }
}

#[async_trait]
impl VectorStoreWriter for QdrantService {
    async fn store_embeddings(
        &self,
        embedded: &[EmbeddedChunk],
    ) -> Result<StorageResult, QdrantError> {
        self.upsert_embeddings(embedded).await
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string())
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Chunk, DocumentProvenance};
    use httpmock::{Method::PUT, MockServer};
    use reqwest::Client;

    fn test_service(base_url: String) -> QdrantService {
        QdrantService {
            client: Client::builder()
                .user_agent("mcq-ingest-test")
                .build()
                .expect("client"),
            base_url,
            api_key: None,
            collection: "quiz-chunks".to_string(),
        }
    }

    fn embedded_chunk(index: usize, text: &str) -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: Chunk {
                index,
                start: index * 1200,
                end: index * 1200 + text.chars().count(),
                text: text.to_string(),
            },
            vector: vec![0.1, 0.9],
            provenance: DocumentProvenance {
                user_id: "user-1".to_string(),
                doc_id: "doc-9".to_string(),
                doc_type: "mcq".to_string(),
            },
        }
    }

    #[tokio::test]
    async fn upsert_sends_points_and_reports_count() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/collections/quiz-chunks/points")
                    .query_param("wait", "true")
                    .json_body_partial(
                        json!({
                            "points": [
                                {
                                    "id": deterministic_point_id("doc-9", 0),
                                    "payload": { "doc_id": "doc-9", "chunk_index": 0 }
                                },
                                {
                                    "id": deterministic_point_id("doc-9", 1),
                                    "payload": { "doc_id": "doc-9", "chunk_index": 1 }
                                }
                            ]
                        })
                        .to_string(),
                    );
                then.status(200).json_body(json!({
                    "status": "ok",
                    "time": 0.0,
                    "result": { "operation_id": 7, "status": "completed" }
                }));
            })
            .await;

        let service = test_service(server.base_url());
        let embedded = vec![embedded_chunk(0, "alpha"), embedded_chunk(1, "beta")];
        let result = service
            .upsert_embeddings(&embedded)
            .await
            .expect("upsert request");

        mock.assert();
        assert_eq!(result.collection, "quiz-chunks");
        assert_eq!(result.points_written, 2);
    }

    #[tokio::test]
    async fn upsert_surfaces_unexpected_statuses() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(PUT).path("/collections/quiz-chunks/points");
                then.status(503).body("unavailable");
            })
            .await;

        let service = test_service(server.base_url());
        let embedded = vec![embedded_chunk(0, "alpha")];
        let error = service
            .upsert_embeddings(&embedded)
            .await
            .expect_err("error status");
        assert!(matches!(
            error,
            QdrantError::UnexpectedStatus { status, .. } if status == StatusCode::SERVICE_UNAVAILABLE
        ));
    }

    #[tokio::test]
    async fn upsert_of_nothing_writes_nothing() {
        let server = MockServer::start_async().await;
        let service = test_service(server.base_url());
        let result = service.upsert_embeddings(&[]).await.expect("empty upsert");
        assert_eq!(result.points_written, 0);
    }
}
