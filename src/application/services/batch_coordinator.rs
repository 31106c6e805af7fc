use std::sync::Arc;

use serde_json::Value;

use crate::application::ports::{ExtractionOracle, OracleError};
use crate::domain::{ExtractionBatch, LineItem};

use super::item_parsing::{ItemError, items_array, json_payload, parse_items};
use super::prompts::{BATCH_SYSTEM_PROMPT, batch_prompt};

pub const DEFAULT_BATCH_SIZE: usize = 10;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BatchExtractionError {
    #[error("batch {batch}: {source}")]
    Oracle { batch: usize, source: OracleError },
    #[error("batch {batch}: answer is not valid JSON: {reason}")]
    MalformedJson { batch: usize, reason: String },
    #[error("batch {batch}: answer contains no item list")]
    MissingItems { batch: usize },
    #[error("batch {batch}: expected {expected} items, got {actual}")]
    CountMismatch {
        batch: usize,
        expected: usize,
        actual: usize,
    },
    #[error("batch {batch}: {source}")]
    InvalidItem { batch: usize, source: ItemError },
}

/// Splits blocks into consecutive batches of at most `batch_size`, preserving
/// order. A zero batch size is treated as one block per batch.
pub fn plan_batches(blocks: &[String], batch_size: usize) -> Vec<ExtractionBatch> {
    blocks
        .chunks(batch_size.max(1))
        .enumerate()
        .map(|(index, chunk)| ExtractionBatch {
            index,
            blocks: chunk.to_vec(),
        })
        .collect()
}

/// Validates one batch answer: it must hold exactly as many well-formed items
/// as the batch had blocks.
pub fn parse_batch_response(
    batch: &ExtractionBatch,
    content: &str,
) -> Result<Vec<LineItem>, BatchExtractionError> {
    let value: Value =
        serde_json::from_str(json_payload(content)).map_err(|e| BatchExtractionError::MalformedJson {
            batch: batch.index,
            reason: e.to_string(),
        })?;

    let raw = items_array(&value).ok_or(BatchExtractionError::MissingItems { batch: batch.index })?;

    if raw.len() != batch.expected_count() {
        return Err(BatchExtractionError::CountMismatch {
            batch: batch.index,
            expected: batch.expected_count(),
            actual: raw.len(),
        });
    }

    parse_items(raw).map_err(|source| BatchExtractionError::InvalidItem {
        batch: batch.index,
        source,
    })
}

/// Sends blocks to the oracle in fixed-size batches and concatenates the
/// answers in batch order. Any failing batch fails the whole run.
pub struct BatchCoordinator {
    batch_size: usize,
}

impl Default for BatchCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchCoordinator {
    pub fn new(batch_size: usize) -> Self {
        Self {
            batch_size: batch_size.max(1),
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    #[tracing::instrument(skip_all, fields(blocks = blocks.len(), batch_size = self.batch_size))]
    pub async fn extract(
        &self,
        oracle: Arc<dyn ExtractionOracle>,
        blocks: Vec<String>,
        reference: Option<String>,
    ) -> Result<Vec<LineItem>, BatchExtractionError> {
        let batches = plan_batches(&blocks, self.batch_size);
        let mut items = Vec::with_capacity(blocks.len());

        for batch in &batches {
            let prompt = batch_prompt(batch, reference.as_deref());
            let content = oracle
                .chat(BATCH_SYSTEM_PROMPT, &prompt)
                .await
                .map_err(|source| BatchExtractionError::Oracle {
                    batch: batch.index,
                    source,
                })?;

            let parsed = parse_batch_response(batch, &content)?;
            tracing::debug!(batch = batch.index, items = parsed.len(), "Batch extracted");
            items.extend(parsed);
        }

        tracing::info!(batches = batches.len(), items = items.len(), "Batch extraction complete");
        Ok(items)
    }
}
