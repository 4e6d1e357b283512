//! Text extraction boundary for uploaded documents.
//!
//! Extraction is an external concern: the pipeline only requires something
//! that turns a file on disk into normalized plain text or fails. The
//! built-in adapter handles plain-text formats; binary formats that need a
//! real parser (or OCR for scanned material) are signalled back to the
//! caller through [`ExtractionError::UnsupportedExtension`].

use async_trait::async_trait;
use std::path::Path;
use thiserror::Error;

/// Errors raised while extracting text from an uploaded document.
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// No extractor is registered for the document's extension.
    #[error("Unsupported document extension: '{0}'")]
    UnsupportedExtension(String),
    /// The document could not be read from disk.
    #[error("Failed to read document: {0}")]
    Io(#[from] std::io::Error),
}

/// Interface implemented by text extraction backends.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Produce normalized plain text for the document at `path`.
    ///
    /// `extension` is the lowercased filename extension without the dot.
    async fn extract(&self, path: &Path, extension: &str) -> Result<String, ExtractionError>;
}

/// Extractor for documents that are already plain text on disk.
pub struct PlainTextExtractor;

const PLAIN_TEXT_EXTENSIONS: [&str; 4] = ["txt", "text", "md", "markdown"];

impl PlainTextExtractor {
    /// Construct a new plain-text extractor.
    pub const fn new() -> Self {
        Self
    }

    fn normalize(raw: String) -> String {
        raw.replace("\r\n", "\n").replace('\r', "\n")
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract(&self, path: &Path, extension: &str) -> Result<String, ExtractionError> {
        if !PLAIN_TEXT_EXTENSIONS.contains(&extension) {
            return Err(ExtractionError::UnsupportedExtension(extension.to_string()));
        }

        tracing::debug!(path = %path.display(), extension, "Extracting plain text");
        let raw = tokio::fs::read_to_string(path).await?;
        Ok(Self::normalize(raw))
    }
}

/// Build the default text extractor.
pub fn get_text_extractor() -> Box<dyn TextExtractor + Send + Sync> {
    Box::new(PlainTextExtractor::new())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn extracts_and_normalizes_line_endings() {
        let mut file = tempfile::Builder::new()
            .suffix(".txt")
            .tempfile()
            .expect("temp file");
        file.write_all(b"alpha\r\nbeta\rgamma\n").expect("write");

        let extractor = PlainTextExtractor::new();
        let text = extractor
            .extract(file.path(), "txt")
            .await
            .expect("extraction");
        assert_eq!(text, "alpha\nbeta\ngamma\n");
    }

    #[tokio::test]
    async fn rejects_unsupported_extensions() {
        let extractor = PlainTextExtractor::new();
        let error = extractor
            .extract(Path::new("/tmp/upload.pdf"), "pdf")
            .await
            .expect_err("unsupported");
        assert!(matches!(error, ExtractionError::UnsupportedExtension(ext) if ext == "pdf"));
    }

    #[tokio::test]
    async fn surfaces_missing_files_as_io_errors() {
        let extractor = PlainTextExtractor::new();
        let error = extractor
            .extract(Path::new("/nonexistent/upload.txt"), "txt")
            .await
            .expect_err("missing file");
        assert!(matches!(error, ExtractionError::Io(_)));
    }
}
