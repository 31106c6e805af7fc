//! Character-level similarity used to recover anchors the oracle paraphrased
//! or that OCR damaged.

/// Levenshtein distance over char slices.
pub(crate) fn edit_distance(a: &[char], b: &[char]) -> usize {
    let m = a.len();
    let n = b.len();

    if m == 0 {
        return n;
    }
    if n == 0 {
        return m;
    }

    let mut prev: Vec<usize> = (0..=n).collect();
    let mut curr = vec![0usize; n + 1];

    for (i, &a_ch) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, &b_ch) in b.iter().enumerate() {
            let cost = if a_ch == b_ch { 0 } else { 1 };
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[n]
}

/// Normalized similarity in `[0.0, 1.0]`; 1.0 means identical.
pub(crate) fn similarity(a: &[char], b: &[char]) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }
    1.0 - edit_distance(a, b) as f64 / longest as f64
}

/// Longer anchors are compared by their leading characters only, which keeps
/// a window scan at `window_chars * MAX_FUZZY_ANCHOR_CHARS^2` steps.
pub(crate) const MAX_FUZZY_ANCHOR_CHARS: usize = 48;

/// Best-scoring position of `needle` inside the `window_chars` characters of
/// `text` that follow byte offset `from`. Comparison is case-insensitive.
/// Returns the byte offset of the match when its score reaches `threshold`.
pub(crate) fn fuzzy_find(
    text: &str,
    from: usize,
    needle: &str,
    window_chars: usize,
    threshold: f64,
) -> Option<(usize, f64)> {
    let needle: Vec<char> = needle
        .chars()
        .take(MAX_FUZZY_ANCHOR_CHARS)
        .map(fold_case)
        .collect();
    if needle.is_empty() || from > text.len() {
        return None;
    }

    let region: Vec<(usize, char)> = text
        .get(from..)?
        .char_indices()
        .take(window_chars)
        .map(|(offset, ch)| (from + offset, fold_case(ch)))
        .collect();
    if region.is_empty() {
        return None;
    }

    let chars: Vec<char> = region.iter().map(|(_, ch)| *ch).collect();
    let span = needle.len().min(chars.len());

    let mut best: Option<(usize, f64)> = None;
    for position in 0..=(chars.len() - span) {
        let score = similarity(&chars[position..position + span], &needle);
        if best.is_none_or(|(_, best_score)| score > best_score) {
            best = Some((position, score));
            if score >= 1.0 {
                break;
            }
        }
    }

    best.filter(|(_, score)| *score >= threshold)
        .map(|(position, score)| (region[position].0, score))
}

fn fold_case(ch: char) -> char {
    ch.to_lowercase().next().unwrap_or(ch)
}
