use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

use super::batch_coordinator::DEFAULT_BATCH_SIZE;
use super::direct_extraction::DEFAULT_LOW_CONFIDENCE_THRESHOLD;
use super::issuer_identification::DEFAULT_ISSUER_CONFIDENCE_THRESHOLD;
use super::segmentation::{AnchorSettings, DEFAULT_ITEM_MARKER};

/// How structured extraction is performed.
///
/// `Marker` segments on a recurring record terminator and is the production
/// default. `Anchor` asks the oracle for a skeleton and resolves its anchors.
/// Both feed the batch coordinator. `Direct` extracts everything in one call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionStrategy {
    #[default]
    Marker,
    Anchor,
    Direct,
}

impl ExtractionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Marker => "marker",
            Self::Anchor => "anchor",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for ExtractionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExtractionStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "marker" => Ok(Self::Marker),
            "anchor" => Ok(Self::Anchor),
            "direct" => Ok(Self::Direct),
            other => Err(format!(
                "{other} is not a supported extraction strategy. Use either `marker`, `anchor` or `direct`."
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PipelineSettings {
    pub strategy: ExtractionStrategy,
    pub batch_size: usize,
    pub item_marker: String,
    pub anchor: AnchorSettings,
    pub low_confidence_threshold: f64,
    pub issuer_confidence_threshold: f64,
    pub artifact_dir: PathBuf,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            strategy: ExtractionStrategy::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            item_marker: DEFAULT_ITEM_MARKER.to_string(),
            anchor: AnchorSettings::default(),
            low_confidence_threshold: DEFAULT_LOW_CONFIDENCE_THRESHOLD,
            issuer_confidence_threshold: DEFAULT_ISSUER_CONFIDENCE_THRESHOLD,
            artifact_dir: std::env::temp_dir().join("invoice-extractor"),
        }
    }
}
