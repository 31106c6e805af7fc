use std::time::Duration;

use async_trait::async_trait;
use pdfium_render::prelude::*;

use crate::application::ports::{TextExtractionError, TextExtractor};
use crate::domain::{ExtractedDocument, PageText};

use super::text_sanitizer::normalize_page_text;

const EXTRACTION_TIMEOUT: Duration = Duration::from_secs(60);

/// Reads the text layer of a PDF through PDFium, including documents that
/// need a user password to open.
#[derive(Debug, Default)]
pub struct PdfiumTextExtractor;

impl PdfiumTextExtractor {
    pub fn new() -> Self {
        Self
    }

    fn extract_pages(
        data: &[u8],
        password: Option<&str>,
    ) -> Result<Vec<PageText>, TextExtractionError> {
        let pdfium = load_pdfium()?;
        let document = pdfium
            .load_pdf_from_byte_slice(data, password)
            .map_err(|e| map_load_error(e, password.is_some()))?;

        let mut pages = Vec::new();
        for (index, page) in document.pages().iter().enumerate() {
            let text = page
                .text()
                .map_err(|e| {
                    TextExtractionError::ExtractionFailed(format!(
                        "page {} text layer unreadable: {e}",
                        index + 1
                    ))
                })?
                .all();

            let normalized = normalize_page_text(&text);
            if !normalized.is_empty() {
                pages.push(PageText {
                    number: index as u32 + 1,
                    text: normalized,
                });
            }
        }

        Ok(pages)
    }
}

fn load_pdfium() -> Result<Pdfium, TextExtractionError> {
    if let Ok(path) = std::env::var("PDFIUM_DYNAMIC_LIB_PATH") {
        let bindings = Pdfium::bind_to_library(&path).map_err(|e| {
            TextExtractionError::ExtractionFailed(format!("failed to load PDFium from {path}: {e}"))
        })?;
        return Ok(Pdfium::new(bindings));
    }

    let bindings = Pdfium::bind_to_system_library().map_err(|e| {
        TextExtractionError::ExtractionFailed(format!(
            "PDFium library not found. Set PDFIUM_DYNAMIC_LIB_PATH or install PDFium: {e}"
        ))
    })?;
    Ok(Pdfium::new(bindings))
}

fn map_load_error(e: PdfiumError, password_supplied: bool) -> TextExtractionError {
    let is_password_error = matches!(
        e,
        PdfiumError::PdfiumLibraryInternalError(PdfiumInternalError::PasswordError)
    ) || {
        let lower = e.to_string().to_lowercase();
        lower.contains("password") || lower.contains("encrypt")
    };

    match (is_password_error, password_supplied) {
        (true, false) => TextExtractionError::PasswordRequired,
        (true, true) => TextExtractionError::PasswordIncorrect,
        (false, _) => TextExtractionError::ExtractionFailed(format!("failed to open PDF: {e}")),
    }
}

#[async_trait]
impl TextExtractor for PdfiumTextExtractor {
    #[tracing::instrument(skip(self, data, password), fields(size = data.len(), with_password = password.is_some()))]
    async fn extract_text(
        &self,
        data: &[u8],
        password: Option<&str>,
    ) -> Result<ExtractedDocument, TextExtractionError> {
        let data = data.to_vec();
        let password = password.map(str::to_owned);

        let pages = tokio::time::timeout(
            EXTRACTION_TIMEOUT,
            tokio::task::spawn_blocking(move || Self::extract_pages(&data, password.as_deref())),
        )
        .await
        .map_err(|_| {
            TextExtractionError::ExtractionFailed(format!(
                "PDF extraction timed out after {}s",
                EXTRACTION_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| TextExtractionError::ExtractionFailed(format!("extraction task panicked: {e}")))??;

        if pages.is_empty() {
            return Err(TextExtractionError::NoTextFound(
                "PDF has no text layer".to_string(),
            ));
        }

        tracing::debug!(pages = pages.len(), "PDF text extracted");
        Ok(ExtractedDocument::new(pages))
    }
}
