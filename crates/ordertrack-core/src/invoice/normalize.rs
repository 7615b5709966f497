//! Line normalization for text recovered from PDF layout reconstruction.

/// Collapse every run of whitespace into a single space and trim the ends.
pub fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn is_line_break(c: char) -> bool {
    matches!(
        c,
        '\n' | '\r' | '\u{0b}' | '\u{0c}' | '\u{1c}' | '\u{1d}' | '\u{1e}' | '\u{85}' | '\u{2028}' | '\u{2029}'
    )
}

/// Split raw text into whitespace-collapsed, non-empty lines in document order.
///
/// Line breaks are the only segmentation boundary; lines are never merged.
pub fn normalize_lines(text: &str) -> Vec<String> {
    text.split(is_line_break)
        .map(collapse_whitespace)
        .filter(|line| !line.is_empty())
        .collect()
}

/// Raw invoice text together with its normalized lines.
///
/// Marker-based extractors scan `raw`; line-based extractors scan `lines`.
#[derive(Debug, Clone)]
pub struct NormalizedText<'a> {
    pub raw: &'a str,
    pub lines: Vec<String>,
}

impl<'a> NormalizedText<'a> {
    pub fn new(raw: &'a str) -> Self {
        Self {
            raw,
            lines: normalize_lines(raw),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
