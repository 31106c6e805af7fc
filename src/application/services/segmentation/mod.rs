mod anchor;
mod marker;
mod similarity;
mod skeleton;

pub use anchor::{
    AnchorSettings, BlockSpan, DEFAULT_FUZZY_THRESHOLD, DEFAULT_FUZZY_WINDOW_CHARS,
    resolve_spans, segment_by_anchors,
};
pub use marker::{DEFAULT_ITEM_MARKER, segment_by_marker};
pub use skeleton::{parse_skeleton, request_skeleton};

use crate::application::ports::OracleError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SegmentationError {
    #[error("skeleton contains no items")]
    EmptySkeleton,
    #[error("malformed skeleton: {0}")]
    InvalidSkeleton(String),
    #[error("start anchor for item {sequence} not found: {anchor:?}")]
    UnresolvedStartAnchor { sequence: u32, anchor: String },
    #[error("end anchor for item {sequence} not found: {anchor:?}")]
    UnresolvedEndAnchor { sequence: u32, anchor: String },
    #[error("item {sequence} resolved to an empty block")]
    EmptyBlock { sequence: u32 },
    #[error("item marker {0:?} not found in document")]
    MarkerNotFound(String),
    #[error("document contains no records before its footer")]
    NoRecords,
    #[error("invalid anchor: {0}")]
    InvalidAnchor(String),
    #[error("structural analysis failed: {0}")]
    Oracle(#[from] OracleError),
}
