//! Noise stripping and whitespace normalization for extracted text.

use std::sync::LazyLock;

use regex::Regex;

/// Anything that is not a word character, whitespace or allowed punctuation.
static RE_DISALLOWED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[^\w\s.,!?;:'"()%\-]"#).unwrap());
/// Horizontal whitespace runs (everything in `\s` except newline).
static RE_INLINE_WS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\S\n]+").unwrap());
/// One or more newlines together with the whitespace around them.
static RE_NEWLINES: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*\n\s*").unwrap());
static RE_SPACE_BEFORE_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r" +([.,!?;:])").unwrap());
static RE_MISSING_SPACE_AFTER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([.!?])(\p{L})").unwrap());

/// Normalizes raw extracted text.
///
/// Strips characters outside the allow-list, collapses whitespace runs to a
/// single space and newline runs to a single newline, then fixes spacing
/// around sentence punctuation. Applying it twice gives the same result as
/// applying it once.
pub fn normalize(text: &str) -> String {
    let stripped = RE_DISALLOWED.replace_all(text, "");
    let spaced = RE_INLINE_WS.replace_all(&stripped, " ");
    let lines = RE_NEWLINES.replace_all(&spaced, "\n");
    let tight = RE_SPACE_BEFORE_PUNCT.replace_all(&lines, "$1");
    let sentences = RE_MISSING_SPACE_AFTER.replace_all(&tight, "$1 $2");
    sentences.trim().to_string()
}
