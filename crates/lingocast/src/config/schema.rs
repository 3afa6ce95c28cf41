use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::secrets::{resolve_secret, Credentials, SecretError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: String,
    /// SQLite file. Defaults to `~/.lingocast/data/lingocast.db`.
    #[serde(default)]
    pub database_path: Option<String>,
    #[serde(default)]
    pub extraction: ExtractionConfig,
    #[serde(default)]
    pub ocr: OcrConfig,
    #[serde(default)]
    pub transcreation: TranscreationConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            database_path: None,
            extraction: ExtractionConfig::default(),
            ocr: OcrConfig::default(),
            transcreation: TranscreationConfig::default(),
            speech: SpeechConfig::default(),
        }
    }
}

impl Config {
    pub fn database_path(&self) -> Option<PathBuf> {
        match &self.database_path {
            Some(path) => Some(PathBuf::from(path)),
            None => crate::db::default_database_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionConfig {
    /// Text-layer extraction stops after this many pages.
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    /// Text-layer output shorter than this (in chars) triggers OCR.
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Character budget applied before transcreation.
    #[serde(default = "default_extraction_budget")]
    pub text_budget: usize,
}

fn default_page_limit() -> u32 {
    3
}

fn default_min_text_chars() -> usize {
    50
}

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_extraction_budget() -> usize {
    crate::text::EXTRACTION_BUDGET
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            page_limit: default_page_limit(),
            min_text_chars: default_min_text_chars(),
            max_upload_bytes: default_max_upload_bytes(),
            text_budget: default_extraction_budget(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Tesseract page segmentation mode.
    #[serde(default = "default_page_seg_mode")]
    pub page_seg_mode: u32,
    #[serde(default = "default_page_limit")]
    pub page_limit: u32,
    #[serde(default = "default_ocr_timeout")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_languages() -> Vec<String> {
    vec!["eng".to_string()]
}

fn default_dpi() -> u32 {
    300
}

fn default_page_seg_mode() -> u32 {
    3
}

fn default_ocr_timeout() -> u64 {
    120
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            languages: default_languages(),
            dpi: default_dpi(),
            page_seg_mode: default_page_seg_mode(),
            page_limit: default_page_limit(),
            timeout_secs: default_ocr_timeout(),
        }
    }
}

fn resolve_credentials(
    direct: &Option<String>,
    file: &Option<String>,
    env: &Option<String>,
) -> Result<Credentials, SecretError> {
    resolve_secret(direct.as_deref(), file.as_deref(), env.as_deref()).map(Credentials::from_secret)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscreationConfig {
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,
    #[serde(default = "default_llm_model")]
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default = "default_llm_key_env")]
    pub api_key_env: Option<String>,
}

fn default_llm_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_llm_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    2000
}

fn default_http_timeout() -> u64 {
    60
}

fn default_llm_key_env() -> Option<String> {
    Some("OPENAI_API_KEY".to_string())
}

impl Default for TranscreationConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_http_timeout(),
            api_key: None,
            api_key_file: None,
            api_key_env: default_llm_key_env(),
        }
    }
}

impl TranscreationConfig {
    pub fn credentials(&self) -> Result<Credentials, SecretError> {
        resolve_credentials(&self.api_key, &self.api_key_file, &self.api_key_env)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default = "default_tts_base_url")]
    pub base_url: String,
    #[serde(default = "default_tts_model")]
    pub model_id: String,
    #[serde(default = "default_stability")]
    pub stability: f32,
    #[serde(default = "default_similarity_boost")]
    pub similarity_boost: f32,
    #[serde(default = "default_output_format")]
    pub output_format: String,
    /// Character budget applied before synthesis.
    #[serde(default = "default_speech_budget")]
    pub text_budget: usize,
    #[serde(default = "default_http_timeout")]
    pub timeout_secs: u64,
    /// Target language name → voice identifier.
    #[serde(default = "default_voices")]
    pub voices: BTreeMap<String, String>,
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub api_key_file: Option<String>,
    #[serde(default = "default_tts_key_env")]
    pub api_key_env: Option<String>,
}

fn default_tts_base_url() -> String {
    "https://api.elevenlabs.io/v1".to_string()
}

fn default_tts_model() -> String {
    "eleven_multilingual_v2".to_string()
}

fn default_stability() -> f32 {
    0.5
}

fn default_similarity_boost() -> f32 {
    0.75
}

fn default_output_format() -> String {
    "mp3_44100_128".to_string()
}

fn default_speech_budget() -> usize {
    crate::text::SPEECH_BUDGET
}

fn default_tts_key_env() -> Option<String> {
    Some("ELEVENLABS_API_KEY".to_string())
}

fn default_voices() -> BTreeMap<String, String> {
    [
        ("English", "21m00Tcm4TlvDq8ikWAM"),
        ("Spanish", "ErXwobaYiN019PkySvjV"),
        ("French", "EXAVITQu4vr4xnSDxMaL"),
        ("German", "TxGEqnHWrfWFTfGW9XjX"),
        ("Italian", "AZnzlk1XvdvUeBnXmlld"),
        ("Portuguese", "pNInz6obpgDQGcFmaJgB"),
        ("Hindi", "MF3mGyEYCl7XYWbV9V6O"),
        ("Japanese", "yoZ06aMxZJJ28mfd3POQ"),
        ("Chinese", "VR6AewLTigWG4xSOukaG"),
    ]
    .into_iter()
    .map(|(lang, voice)| (lang.to_string(), voice.to_string()))
    .collect()
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            base_url: default_tts_base_url(),
            model_id: default_tts_model(),
            stability: default_stability(),
            similarity_boost: default_similarity_boost(),
            output_format: default_output_format(),
            text_budget: default_speech_budget(),
            timeout_secs: default_http_timeout(),
            voices: default_voices(),
            api_key: None,
            api_key_file: None,
            api_key_env: default_tts_key_env(),
        }
    }
}

impl SpeechConfig {
    pub fn credentials(&self) -> Result<Credentials, SecretError> {
        resolve_credentials(&self.api_key, &self.api_key_file, &self.api_key_env)
    }

    /// Looks up the voice for a language name, ignoring case and surrounding whitespace.
    pub fn voice_for(&self, language: &str) -> Option<&str> {
        let wanted = language.trim();
        self.voices
            .iter()
            .find(|(lang, _)| lang.eq_ignore_ascii_case(wanted))
            .map(|(_, voice)| voice.as_str())
    }
}
