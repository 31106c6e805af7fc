use serde::{Deserialize, Serialize};

/// Where one logical record starts and ends in the document text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkeletonItem {
    pub sequence: u32,
    pub start_anchor: String,
    pub end_anchor: String,
}

impl SkeletonItem {
    pub fn new(sequence: u32, start_anchor: impl Into<String>, end_anchor: impl Into<String>) -> Self {
        Self {
            sequence,
            start_anchor: start_anchor.into(),
            end_anchor: end_anchor.into(),
        }
    }
}

/// Ordered group of block texts sent to the oracle in a single call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionBatch {
    pub index: usize,
    pub blocks: Vec<String>,
}

impl ExtractionBatch {
    pub fn expected_count(&self) -> usize {
        self.blocks.len()
    }
}
