use async_trait::async_trait;

use crate::application::ports::{TextExtractionError, TextExtractor};
use crate::domain::{ExtractedDocument, PageText};

/// Returns fixed pages, optionally guarded by a password.
pub struct MockTextExtractor {
    pages: Vec<String>,
    password: Option<String>,
}

impl MockTextExtractor {
    pub fn new(pages: Vec<String>) -> Self {
        Self {
            pages,
            password: None,
        }
    }

    pub fn single_page(text: impl Into<String>) -> Self {
        Self::new(vec![text.into()])
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}

#[async_trait]
impl TextExtractor for MockTextExtractor {
    async fn extract_text(
        &self,
        _data: &[u8],
        password: Option<&str>,
    ) -> Result<ExtractedDocument, TextExtractionError> {
        match (&self.password, password) {
            (Some(_), None) => return Err(TextExtractionError::PasswordRequired),
            (Some(expected), Some(given)) if expected != given => {
                return Err(TextExtractionError::PasswordIncorrect);
            }
            _ => {}
        }

        Ok(ExtractedDocument::new(
            self.pages
                .iter()
                .enumerate()
                .map(|(i, text)| PageText {
                    number: i as u32 + 1,
                    text: text.clone(),
                })
                .collect(),
        ))
    }
}
