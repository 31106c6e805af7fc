use async_trait::async_trait;

use crate::domain::ExtractedDocument;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    async fn extract_text(
        &self,
        data: &[u8],
        password: Option<&str>,
    ) -> Result<ExtractedDocument, TextExtractionError>;
}

/// Closed set of text extraction outcomes the pipeline distinguishes.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TextExtractionError {
    #[error("document is password protected")]
    PasswordRequired,
    #[error("incorrect password")]
    PasswordIncorrect,
    #[error("no extractable text found in {0}")]
    NoTextFound(String),
    #[error("extraction failed: {0}")]
    ExtractionFailed(String),
}
