use async_trait::async_trait;

use crate::application::ports::{TextExtractionError, TextExtractor};
use crate::domain::ExtractedDocument;

use super::text_sanitizer::normalize_page_text;

/// Treats the input as UTF-8 text forming a single page.
#[derive(Debug, Default)]
pub struct PlainTextExtractor;

#[async_trait]
impl TextExtractor for PlainTextExtractor {
    async fn extract_text(
        &self,
        data: &[u8],
        _password: Option<&str>,
    ) -> Result<ExtractedDocument, TextExtractionError> {
        let text = std::str::from_utf8(data)
            .map_err(|e| TextExtractionError::ExtractionFailed(format!("input is not UTF-8: {e}")))?;

        let normalized = normalize_page_text(text);
        if normalized.is_empty() {
            return Err(TextExtractionError::NoTextFound("text input".to_string()));
        }

        Ok(ExtractedDocument::from_text(normalized))
    }
}
