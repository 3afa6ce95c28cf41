//! Sentence-aware truncation to a character budget.
//!
//! Lengths are counted in `char`s, never bytes, so multi-byte text is cut on
//! character boundaries and budgets mean the same thing in every language.

use serde::Serialize;

/// Character budget applied to extracted text before transcreation.
pub const EXTRACTION_BUDGET: usize = 2200;

/// Character budget applied to transcreated text before speech synthesis.
pub const SPEECH_BUDGET: usize = 2000;

/// How a text is shortened when it exceeds its budget.
#[derive(Debug, Clone, PartialEq)]
pub struct TruncationPolicy {
    /// Maximum number of characters kept (excluding the overflow marker).
    pub budget: usize,
    /// Characters that end a sentence.
    pub terminators: &'static [char],
    /// A sentence boundary is only used if it keeps at least this share of the budget.
    pub min_keep_ratio: f64,
    /// Appended when no usable sentence boundary was found.
    pub overflow_marker: Option<&'static str>,
}

impl TruncationPolicy {
    /// Extraction path: backtrack to a period, otherwise keep the hard cut.
    pub fn extraction(budget: usize) -> Self {
        Self {
            budget,
            terminators: &['.'],
            min_keep_ratio: 0.8,
            overflow_marker: None,
        }
    }

    /// Speech path: backtrack to `.`, `?` or `!` no further than 70% of the
    /// budget, otherwise hard cut plus an ellipsis.
    pub fn speech(budget: usize) -> Self {
        Self {
            budget,
            terminators: &['.', '?', '!'],
            min_keep_ratio: 0.7,
            overflow_marker: Some("..."),
        }
    }

    pub fn with_min_keep_ratio(mut self, ratio: f64) -> Self {
        self.min_keep_ratio = ratio;
        self
    }
}

impl Default for TruncationPolicy {
    fn default() -> Self {
        Self::extraction(EXTRACTION_BUDGET)
    }
}

/// Outcome of a truncation, reported to the caller for cost transparency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Truncation {
    pub text: String,
    pub was_truncated: bool,
    pub original_length: usize,
    pub final_length: usize,
}

/// Shortens `text` to the policy budget, preferring a sentence boundary.
pub fn truncate(text: &str, policy: &TruncationPolicy) -> Truncation {
    let original_length = text.chars().count();
    if original_length <= policy.budget {
        return Truncation {
            text: text.to_string(),
            was_truncated: false,
            original_length,
            final_length: original_length,
        };
    }

    let cut = text
        .char_indices()
        .nth(policy.budget)
        .map(|(i, _)| i)
        .unwrap_or(text.len());
    let head = &text[..cut];

    let boundary = head
        .char_indices()
        .rev()
        .find(|(_, c)| policy.terminators.contains(c))
        .map(|(i, c)| i + c.len_utf8());

    let min_keep = policy.budget as f64 * policy.min_keep_ratio;
    let result = match boundary {
        Some(end) if end > 0 && head[..end].chars().count() as f64 >= min_keep => {
            head[..end].to_string()
        }
        _ => match policy.overflow_marker {
            Some(marker) => format!("{}{}", head.trim_end(), marker),
            None => head.to_string(),
        },
    };

    let final_length = result.chars().count();
    Truncation {
        text: result,
        was_truncated: true,
        original_length,
        final_length,
    }
}
