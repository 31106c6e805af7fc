use regex::RegexBuilder;

use super::SegmentationError;

pub const DEFAULT_ITEM_MARKER: &str = "Vl. Total";

/// Splits a document on a recurring record terminator.
///
/// Each record runs from the previous cut to the end of the line holding its
/// terminating marker. The final occurrence belongs to the document footer
/// (the summary totals line), so it and everything after the previous cut is
/// discarded: `n` occurrences yield `n - 1` records.
pub fn segment_by_marker(text: &str, marker: &str) -> Result<Vec<String>, SegmentationError> {
    if marker.trim().is_empty() {
        return Err(SegmentationError::InvalidAnchor(
            "item marker must not be empty".to_string(),
        ));
    }

    let pattern = RegexBuilder::new(&regex::escape(marker))
        .case_insensitive(true)
        .build()
        .map_err(|e| SegmentationError::InvalidAnchor(e.to_string()))?;

    let mut cuts: Vec<usize> = Vec::new();
    for found in pattern.find_iter(text) {
        let cut = end_of_line(text, found.end());
        // Several markers on one line terminate a single record.
        if cuts.last().is_none_or(|&last| cut > last) {
            cuts.push(cut);
        }
    }

    if cuts.is_empty() {
        return Err(SegmentationError::MarkerNotFound(marker.to_string()));
    }

    let record_cuts = &cuts[..cuts.len() - 1];
    if record_cuts.is_empty() {
        return Err(SegmentationError::NoRecords);
    }

    let mut blocks = Vec::with_capacity(record_cuts.len());
    let mut previous = 0;
    for (index, &cut) in record_cuts.iter().enumerate() {
        let block = text[previous..cut].trim();
        if block.is_empty() {
            return Err(SegmentationError::EmptyBlock {
                sequence: index as u32 + 1,
            });
        }
        blocks.push(block.to_string());
        previous = cut;
    }

    Ok(blocks)
}

fn end_of_line(text: &str, from: usize) -> usize {
    text[from..]
        .find('\n')
        .map(|offset| from + offset + 1)
        .unwrap_or(text.len())
}
