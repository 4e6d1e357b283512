use std::io::Write;
use std::path::Path;

use httpmock::{Method::GET, Method::PUT, MockServer};
use mcq_ingest::{config, pipeline::{IngestPipeline, PipelineOutcome}};
use serde_json::json;

fn set_env(key: &str, value: &str) {
    // SAFETY: The test configures the environment before anything reads it.
    unsafe { std::env::set_var(key, value) }
}

async fn mock_qdrant() -> MockServer {
    let server = MockServer::start_async().await;

    server
        .mock_async(|when, then| {
            when.method(GET).path("/collections/quiz-chunks");
            then.status(200).json_body(json!({
                "status": "ok",
                "time": 0.0,
                "result": { "status": "green" }
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/collections/quiz-chunks/index");
            then.status(200).json_body(json!({
                "status": "ok",
                "time": 0.0,
                "result": { "operation_id": 1, "status": "acknowledged" }
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/collections/quiz-chunks/points");
            then.status(200).json_body(json!({
                "status": "ok",
                "time": 0.0,
                "result": { "operation_id": 2, "status": "completed" }
            }));
        })
        .await;

    server
}

#[tokio::test]
async fn pipeline_ingests_a_document_end_to_end() {
    let server = mock_qdrant().await;

    set_env("QDRANT_URL", &server.base_url());
    set_env("QDRANT_COLLECTION_NAME", "quiz-chunks");
    set_env("EMBEDDING_PROVIDER", "deterministic");
    set_env("EMBEDDING_MODEL", "content-hash");
    set_env("EMBEDDING_DIMENSION", "8");
    set_env("CHUNK_SIZE", "120");
    set_env("CHUNK_OVERLAP", "24");
    config::init_config();

    let pipeline = IngestPipeline::new().await.expect("pipeline bootstrap");

    // A document long enough to produce several overlapping chunks.
    let mut file = tempfile::Builder::new()
        .suffix(".txt")
        .tempfile()
        .expect("temp file");
    let body = "Cell biology covers the structure and function of the cell. ".repeat(20);
    file.write_all(body.as_bytes()).expect("write document");

    let outcome = pipeline
        .ingest_document(file.path(), "cell-biology.txt", "user-1", "doc-9", "mcq")
        .await
        .expect("stored outcome");

    match outcome {
        PipelineOutcome::Stored { storage_result } => {
            assert_eq!(storage_result.collection, "quiz-chunks");
            assert!(storage_result.points_written > 1);
        }
        other => panic!("expected Stored, got {other:?}"),
    }

    let snapshot = pipeline.metrics_snapshot();
    assert_eq!(snapshot.documents_ingested, 1);
    assert!(snapshot.chunks_embedded > 1);

    // Whitespace-only uploads come back as a recognized outcome, not an error.
    let mut empty_file = tempfile::Builder::new()
        .suffix(".txt")
        .tempfile()
        .expect("temp file");
    empty_file.write_all(b"   \n\t  ").expect("write document");

    let outcome = pipeline
        .ingest_document(empty_file.path(), "blank.txt", "user-1", "doc-10", "mcq")
        .await
        .expect("recognized outcome");

    match outcome {
        PipelineOutcome::NoContent { chunk_count, error, .. } => {
            assert_eq!(chunk_count, 0);
            assert!(error.contains("OCR"));
        }
        other => panic!("expected NoContent, got {other:?}"),
    }

    // Unsupported uploads surface as a wrapped extraction fault.
    let error = pipeline
        .ingest_document(Path::new("/tmp/scan.pdf"), "scan.pdf", "user-1", "doc-11", "mcq")
        .await
        .expect_err("extraction fault");
    assert!(error.to_string().starts_with("[MCQ Pipeline] Failed:"));
}
