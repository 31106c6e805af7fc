use std::sync::Arc;

use serde_json::Value;

use crate::application::ports::{ExtractionOracle, OracleError};
use crate::domain::ExtractionResult;

use super::item_parsing::{ItemError, items_array, json_payload, parse_header, parse_items};
use super::prompts::{DIRECT_SYSTEM_PROMPT, direct_prompt};

pub const DEFAULT_LOW_CONFIDENCE_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DirectExtractionError {
    #[error(transparent)]
    Oracle(#[from] OracleError),
    #[error("answer is not valid JSON: {0}")]
    MalformedJson(String),
    #[error("answer contains no item list")]
    MissingItems,
    #[error(transparent)]
    InvalidItem(#[from] ItemError),
}

pub fn parse_direct_response(content: &str) -> Result<ExtractionResult, DirectExtractionError> {
    let value: Value = serde_json::from_str(json_payload(content))
        .map_err(|e| DirectExtractionError::MalformedJson(e.to_string()))?;

    let raw = items_array(&value).ok_or(DirectExtractionError::MissingItems)?;
    let items = parse_items(raw)?;

    Ok(ExtractionResult::new(parse_header(&value), items))
}

/// Whole-document extraction in a single oracle call. When the mean item
/// confidence falls below the threshold the call is made exactly once more
/// and the second answer replaces the first.
pub struct DirectExtractor {
    low_confidence_threshold: f64,
}

impl Default for DirectExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_LOW_CONFIDENCE_THRESHOLD)
    }
}

impl DirectExtractor {
    pub fn new(low_confidence_threshold: f64) -> Self {
        Self {
            low_confidence_threshold,
        }
    }

    #[tracing::instrument(skip_all, fields(text_len = text.len()))]
    pub async fn extract(
        &self,
        oracle: Arc<dyn ExtractionOracle>,
        text: String,
        reference: Option<String>,
    ) -> Result<ExtractionResult, DirectExtractionError> {
        let prompt = direct_prompt(&text, reference.as_deref());
        let first = self.attempt(oracle.as_ref(), &prompt).await?;

        let confidence = first.average_confidence();
        if first.items.is_empty() || confidence >= self.low_confidence_threshold {
            return Ok(first);
        }

        tracing::warn!(
            confidence,
            threshold = self.low_confidence_threshold,
            "Low extraction confidence, re-attempting"
        );

        match self.attempt(oracle.as_ref(), &prompt).await {
            Ok(second) => {
                tracing::info!(
                    first = confidence,
                    second = second.average_confidence(),
                    "Using re-attempted answer"
                );
                Ok(second)
            }
            Err(e) => {
                tracing::warn!(error = %e, "Re-attempt failed, keeping first answer");
                Ok(first)
            }
        }
    }

    async fn attempt(
        &self,
        oracle: &dyn ExtractionOracle,
        prompt: &str,
    ) -> Result<ExtractionResult, DirectExtractionError> {
        let content = oracle.chat(DIRECT_SYSTEM_PROMPT, prompt).await?;
        parse_direct_response(&content)
    }
}
