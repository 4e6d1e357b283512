//! Helpers for constructing Qdrant payloads and deterministic point identity.

use crate::pipeline::EmbeddedChunk;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;
use uuid::Uuid;

/// Build the payload object stored alongside each indexed chunk.
///
/// Every field needed to trace a vector back to its origin is present:
/// owner, document, document type, and the chunk's index and span.
pub(crate) fn build_payload(embedded: &EmbeddedChunk, timestamp_rfc3339: &str) -> Value {
    let mut payload = Map::new();
    payload.insert(
        "user_id".into(),
        Value::String(embedded.provenance.user_id.clone()),
    );
    payload.insert(
        "doc_id".into(),
        Value::String(embedded.provenance.doc_id.clone()),
    );
    payload.insert(
        "doc_type".into(),
        Value::String(embedded.provenance.doc_type.clone()),
    );
    payload.insert("chunk_index".into(), Value::from(embedded.chunk.index));
    payload.insert("chunk_start".into(), Value::from(embedded.chunk.start));
    payload.insert("chunk_end".into(), Value::from(embedded.chunk.end));
    payload.insert(
        "chunk_hash".into(),
        Value::String(compute_chunk_hash(&embedded.chunk.text)),
    );
    payload.insert("text".into(), Value::String(embedded.chunk.text.clone()));
    payload.insert(
        "timestamp".into(),
        Value::String(timestamp_rfc3339.to_string()),
    );
    Value::Object(payload)
}

/// Compute a deterministic SHA-256 hash for the chunk text.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Derive a stable point identifier from document identity and chunk index.
///
/// Re-ingesting the same document overwrites its own points instead of
/// accumulating duplicates, which is what makes the upsert idempotent.
pub(crate) fn deterministic_point_id(doc_id: &str, chunk_index: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(doc_id.as_bytes());
    hasher.update([0x1f]);
    hasher.update(chunk_index.to_le_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 16];
    bytes.copy_from_slice(&digest[..16]);
    Uuid::from_bytes(bytes).to_string()
}

/// Current timestamp formatted for payload storage.
pub(crate) fn current_timestamp_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Chunk, DocumentProvenance};

    fn sample_embedded() -> EmbeddedChunk {
        EmbeddedChunk {
            chunk: Chunk {
                index: 3,
                start: 3600,
                end: 4000,
                text: "closing section".to_string(),
            },
            vector: vec![0.5, 0.5],
            provenance: DocumentProvenance {
                user_id: "user-1".to_string(),
                doc_id: "doc-9".to_string(),
                doc_type: "mcq".to_string(),
            },
        }
    }

    #[test]
    fn chunk_hash_is_stable() {
        let h1 = compute_chunk_hash("Hello world");
        let h2 = compute_chunk_hash("Hello world");
        assert_eq!(h1, h2);
        assert!(!h1.is_empty());
    }

    #[test]
    fn point_id_is_stable_per_document_and_index() {
        let a = deterministic_point_id("doc-9", 3);
        let b = deterministic_point_id("doc-9", 3);
        let other_index = deterministic_point_id("doc-9", 4);
        let other_doc = deterministic_point_id("doc-10", 3);

        assert_eq!(a, b);
        assert_ne!(a, other_index);
        assert_ne!(a, other_doc);
        assert!(Uuid::parse_str(&a).is_ok());
    }

    #[test]
    fn payload_carries_full_provenance() {
        let embedded = sample_embedded();
        let payload = build_payload(&embedded, "2025-01-01T00:00:00Z");

        assert_eq!(payload["user_id"], "user-1");
        assert_eq!(payload["doc_id"], "doc-9");
        assert_eq!(payload["doc_type"], "mcq");
        assert_eq!(payload["chunk_index"], 3);
        assert_eq!(payload["chunk_start"], 3600);
        assert_eq!(payload["chunk_end"], 4000);
        assert_eq!(payload["text"], "closing section");
        assert_eq!(payload["timestamp"], "2025-01-01T00:00:00Z");
        assert_eq!(
            payload["chunk_hash"],
            Value::String(compute_chunk_hash("closing section"))
        );
    }

    #[test]
    fn timestamp_is_rfc3339_like() {
        let ts = current_timestamp_rfc3339();
        assert!(ts.contains('T') && ts.ends_with('Z'));
    }
}
