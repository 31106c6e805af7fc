use std::sync::LazyLock;

use regex::Regex;
use unicode_normalization::UnicodeNormalization;

static HYPHEN_NEWLINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<prefix>\w)-[ \t]*\r?\n[ \t]*(?P<suffix>[[:lower:]])")
        .unwrap_or_else(|e| panic!("invalid hyphenation pattern: {e}"))
});

/// Normalizes text pulled out of a page so that downstream marker and anchor
/// searches see a stable form: NFKC, no control characters, words rejoined
/// across line-break hyphens, single spaces within lines, and at most one
/// blank line between paragraphs.
pub fn normalize_page_text(raw: &str) -> String {
    let normalized: String = raw
        .replace("\r\n", "\n")
        .replace('\r', "\n")
        .nfkc()
        .filter(|c| !c.is_control() || *c == '\n' || *c == '\t')
        .collect();
    let joined = HYPHEN_NEWLINE.replace_all(&normalized, "$prefix$suffix");

    let mut lines: Vec<String> = Vec::new();
    let mut pending_blank = false;

    for line in joined.lines() {
        let collapsed = line.split_whitespace().collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            pending_blank = !lines.is_empty();
            continue;
        }
        if pending_blank {
            lines.push(String::new());
            pending_blank = false;
        }
        lines.push(collapsed);
    }

    lines.join("\n")
}
