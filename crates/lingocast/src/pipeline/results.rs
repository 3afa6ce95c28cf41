use serde::Serialize;

use crate::processor::TextSource;
use crate::text::Truncation;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResult {
    pub text: String,
    pub page_count: u32,
    pub extracted_page_count: u32,
    /// Normalized length before the budget was applied.
    pub original_length: usize,
    pub extracted_length: usize,
    pub was_truncated: bool,
    pub document_id: i64,
    pub cached: bool,
    pub text_source: TextSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscreateResult {
    pub text: String,
    /// `None` when no document was given, so nothing was stored.
    pub transcreation_id: Option<i64>,
    /// Zero on a cache hit.
    pub tokens_used: u32,
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SynthesizeResult {
    /// `data:audio/mpeg;base64,...`
    pub audio: String,
    pub audio_size: usize,
    /// Zero on a cache hit.
    pub characters_used: usize,
    pub voice_id: String,
    pub audio_id: Option<i64>,
    pub cached: bool,
    /// Present when the text was sent to the service.
    pub truncation: Option<Truncation>,
}

/// MIME prefix of the returned audio URI.
pub const AUDIO_DATA_URI_PREFIX: &str = "data:audio/mpeg;base64,";

pub fn audio_data_uri(base64_audio: &str) -> String {
    format!("{}{}", AUDIO_DATA_URI_PREFIX, base64_audio)
}
