//! Text extraction gateway.
//!
//! The engine delegates file parsing to a [`TextExtractionGateway`];
//! format-specific extractors (PDF, HTML, office formats) plug in behind
//! the same trait. [`PlainTextExtractor`] ships as the default so the
//! binary works on text corpora out of the box.

use std::path::Path;

use async_trait::async_trait;

use crate::error::ExtractError;

/// Gateway that turns a file on disk into plain UTF-8 text.
///
/// Extraction never panics on bad input; it returns an [`ExtractError`]
/// and the indexing coordinator records the file as failed and moves on.
#[async_trait]
pub trait TextExtractionGateway: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

/// Extractor for plain UTF-8 text files.
///
/// Enforces a size cap, rejects binary content (embedded NUL bytes), and
/// reports undecodable bytes as corrupt.
pub struct PlainTextExtractor {
    max_bytes: u64,
}

impl PlainTextExtractor {
    pub fn new(max_bytes: u64) -> Self {
        Self { max_bytes }
    }
}

#[async_trait]
impl TextExtractionGateway for PlainTextExtractor {
    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let metadata = std::fs::metadata(path)?;
        if metadata.len() > self.max_bytes {
            return Err(ExtractError::TooLarge {
                size: metadata.len(),
                limit: self.max_bytes,
            });
        }

        let bytes = std::fs::read(path)?;
        if bytes.contains(&0) {
            return Err(ExtractError::Unsupported(format!(
                "{} contains binary content",
                path.display()
            )));
        }

        String::from_utf8(bytes)
            .map_err(|e| ExtractError::Corrupt(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extracts_utf8_text() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("note.txt");
        std::fs::write(&path, "hello world").unwrap();

        let extractor = PlainTextExtractor::new(1024);
        let text = extractor.extract(&path).await.unwrap();
        assert_eq!(text, "hello world");
    }

    #[tokio::test]
    async fn oversized_file_is_too_large() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("big.txt");
        std::fs::write(&path, "a".repeat(64)).unwrap();

        let extractor = PlainTextExtractor::new(16);
        let err = extractor.extract(&path).await.unwrap_err();
        assert!(matches!(err, ExtractError::TooLarge { .. }));
    }

    #[tokio::test]
    async fn binary_content_is_unsupported() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("blob.txt");
        std::fs::write(&path, [0x68u8, 0x69, 0x00, 0x68]).unwrap();

        let extractor = PlainTextExtractor::new(1024);
        let err = extractor.extract(&path).await.unwrap_err();
        assert!(matches!(err, ExtractError::Unsupported(_)));
    }

    #[tokio::test]
    async fn invalid_utf8_is_corrupt() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("bad.txt");
        std::fs::write(&path, [0xffu8, 0xfe, 0xfd]).unwrap();

        let extractor = PlainTextExtractor::new(1024);
        let err = extractor.extract(&path).await.unwrap_err();
        assert!(matches!(err, ExtractError::Corrupt(_)));
    }

    #[tokio::test]
    async fn missing_file_is_io_error() {
        let extractor = PlainTextExtractor::new(1024);
        let err = extractor.extract(Path::new("/nonexistent/x.txt")).await.unwrap_err();
        assert!(matches!(err, ExtractError::Io(_)));
    }
}
