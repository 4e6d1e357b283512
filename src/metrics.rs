use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing ingestion activity.
#[derive(Default)]
pub struct IngestMetrics {
    documents_ingested: AtomicU64,
    chunks_embedded: AtomicU64,
    documents_truncated: AtomicU64,
}

impl IngestMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a stored document and the number of chunks written for it.
    pub fn record_document(&self, chunk_count: u64) {
        self.documents_ingested.fetch_add(1, Ordering::Relaxed);
        self.chunks_embedded.fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record a document whose chunk sequence hit the configured cap.
    pub fn record_truncation(&self) {
        self.documents_truncated.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_ingested: self.documents_ingested.load(Ordering::Relaxed),
            chunks_embedded: self.chunks_embedded.load(Ordering::Relaxed),
            documents_truncated: self.documents_truncated.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of ingestion counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents stored since startup.
    pub documents_ingested: u64,
    /// Total chunk count embedded across all stored documents.
    pub chunks_embedded: u64,
    /// Number of documents whose chunk sequence was cut at the cap.
    pub documents_truncated: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_documents_and_chunks() {
        let metrics = IngestMetrics::new();
        metrics.record_document(2);
        metrics.record_document(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_ingested, 2);
        assert_eq!(snapshot.chunks_embedded, 5);
        assert_eq!(snapshot.documents_truncated, 0);
    }

    #[test]
    fn records_truncations_separately() {
        let metrics = IngestMetrics::new();
        metrics.record_truncation();
        metrics.record_document(2000);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.documents_truncated, 1);
        assert_eq!(snapshot.documents_ingested, 1);
    }
}
