use regex::RegexBuilder;

use crate::domain::SkeletonItem;

use super::SegmentationError;
use super::similarity::fuzzy_find;

pub const DEFAULT_FUZZY_WINDOW_CHARS: usize = 2000;
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 0.8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnchorSettings {
    pub fuzzy_window_chars: usize,
    pub fuzzy_threshold: f64,
}

impl Default for AnchorSettings {
    fn default() -> Self {
        Self {
            fuzzy_window_chars: DEFAULT_FUZZY_WINDOW_CHARS,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
        }
    }
}

/// Byte range of one resolved block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockSpan {
    pub sequence: u32,
    pub start: usize,
    pub end: usize,
}

/// Resolves every skeleton item to a span, in sequence order.
///
/// The search cursor only moves forward, so spans are disjoint and ordered
/// even when the same anchor text repeats. Any unresolved anchor fails the
/// whole skeleton.
pub fn resolve_spans(
    text: &str,
    skeleton: &[SkeletonItem],
    settings: &AnchorSettings,
) -> Result<Vec<BlockSpan>, SegmentationError> {
    if skeleton.is_empty() {
        return Err(SegmentationError::EmptySkeleton);
    }

    let mut ordered: Vec<&SkeletonItem> = skeleton.iter().collect();
    ordered.sort_by_key(|item| item.sequence);

    let mut cursor = 0;
    let mut spans = Vec::with_capacity(ordered.len());

    for item in ordered {
        let start = locate_start(text, cursor, item, settings)?;
        let end = locate_end(text, start, item)?;

        if text[start..end].trim().is_empty() {
            return Err(SegmentationError::EmptyBlock {
                sequence: item.sequence,
            });
        }

        spans.push(BlockSpan {
            sequence: item.sequence,
            start,
            end,
        });
        cursor = end;
    }

    Ok(spans)
}

pub fn segment_by_anchors(
    text: &str,
    skeleton: &[SkeletonItem],
    settings: &AnchorSettings,
) -> Result<Vec<String>, SegmentationError> {
    let spans = resolve_spans(text, skeleton, settings)?;
    Ok(spans
        .into_iter()
        .map(|span| text[span.start..span.end].to_string())
        .collect())
}

fn locate_start(
    text: &str,
    cursor: usize,
    item: &SkeletonItem,
    settings: &AnchorSettings,
) -> Result<usize, SegmentationError> {
    let anchor = item.start_anchor.as_str();
    let unresolved = || SegmentationError::UnresolvedStartAnchor {
        sequence: item.sequence,
        anchor: anchor.to_string(),
    };

    if anchor.trim().is_empty() {
        return Err(unresolved());
    }

    if let Some(offset) = text[cursor..].find(anchor) {
        return Ok(cursor + offset);
    }

    match fuzzy_find(
        text,
        cursor,
        anchor,
        settings.fuzzy_window_chars,
        settings.fuzzy_threshold,
    ) {
        Some((offset, score)) => {
            tracing::debug!(
                sequence = item.sequence,
                score,
                offset,
                "Start anchor resolved by similarity search"
            );
            Ok(offset)
        }
        None => Err(unresolved()),
    }
}

fn locate_end(text: &str, start: usize, item: &SkeletonItem) -> Result<usize, SegmentationError> {
    let anchor = item.end_anchor.as_str();
    if anchor.trim().is_empty() {
        return Err(SegmentationError::UnresolvedEndAnchor {
            sequence: item.sequence,
            anchor: anchor.to_string(),
        });
    }

    let pattern = RegexBuilder::new(&regex::escape(anchor))
        .case_insensitive(true)
        .build()
        .map_err(|e| SegmentationError::InvalidAnchor(e.to_string()))?;

    pattern
        .find_at(text, start)
        .map(|m| m.end())
        .ok_or_else(|| SegmentationError::UnresolvedEndAnchor {
            sequence: item.sequence,
            anchor: anchor.to_string(),
        })
}
