//! Text normalisation applied before embedding, plus helpers for previews
//! and minimum-length checks on extracted text.

use std::sync::LazyLock;

use regex::Regex;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Default minimum number of characters an extracted document must contain.
pub const MIN_TEXT_CHARS: usize = 20;

/// Default preview length returned alongside a prediction.
pub const PREVIEW_CHARS: usize = 500;

/// Normalise text for the encoder.
///
/// Every character outside ASCII letters, digits and whitespace becomes a
/// space, whitespace runs collapse to one space, and the result is
/// lower-cased and trimmed.
pub fn clean_text(text: &str) -> String {
    let alnum = NON_ALNUM.replace_all(text, " ");
    let collapsed = WHITESPACE.replace_all(&alnum, " ");
    collapsed.to_lowercase().trim().to_string()
}

/// First `max_chars` characters of `text` with non-printable characters
/// removed. Line breaks count as non-printable, so lines run together.
pub fn preview(text: &str, max_chars: usize) -> String {
    text.chars()
        .take(max_chars)
        .filter(|&c| is_printable(c))
        .collect()
}

/// Whether the trimmed text has at least `min_chars` characters.
pub fn has_enough_text(text: &str, min_chars: usize) -> bool {
    text.trim().chars().count() >= min_chars
}

fn is_printable(c: char) -> bool {
    c == ' ' || !(c.is_control() || c.is_whitespace())
}
