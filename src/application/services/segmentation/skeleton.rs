use serde::Deserialize;

use crate::application::ports::ExtractionOracle;
use crate::application::services::item_parsing::json_payload;
use crate::application::services::prompts::{SKELETON_SYSTEM_PROMPT, skeleton_prompt};
use crate::domain::SkeletonItem;

use super::SegmentationError;

#[derive(Deserialize)]
#[serde(untagged)]
enum SkeletonResponse {
    Wrapped { items: Vec<RawSkeletonItem> },
    Bare(Vec<RawSkeletonItem>),
}

#[derive(Deserialize)]
struct RawSkeletonItem {
    #[serde(default)]
    sequence: Option<u32>,
    start_anchor: String,
    end_anchor: String,
}

/// Parses the structural-analysis answer into skeleton items. Items without a
/// sequence number take their position in the answer.
pub fn parse_skeleton(content: &str) -> Result<Vec<SkeletonItem>, SegmentationError> {
    let response: SkeletonResponse = serde_json::from_str(json_payload(content))
        .map_err(|e| SegmentationError::InvalidSkeleton(e.to_string()))?;

    let raw = match response {
        SkeletonResponse::Wrapped { items } => items,
        SkeletonResponse::Bare(items) => items,
    };

    if raw.is_empty() {
        return Err(SegmentationError::EmptySkeleton);
    }

    Ok(raw
        .into_iter()
        .enumerate()
        .map(|(index, item)| SkeletonItem {
            sequence: item.sequence.unwrap_or(index as u32 + 1),
            start_anchor: item.start_anchor,
            end_anchor: item.end_anchor,
        })
        .collect())
}

/// Asks the oracle for the structural outline of the document.
pub async fn request_skeleton(
    oracle: &dyn ExtractionOracle,
    text: &str,
) -> Result<Vec<SkeletonItem>, SegmentationError> {
    let content = oracle
        .chat(SKELETON_SYSTEM_PROMPT, &skeleton_prompt(text))
        .await?;
    let skeleton = parse_skeleton(&content)?;
    tracing::debug!(items = skeleton.len(), "Skeleton received");
    Ok(skeleton)
}
