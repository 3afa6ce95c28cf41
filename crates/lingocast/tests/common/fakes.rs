//! Counting test doubles.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use lingocast::processor::ocr::OcrEngine;
use lingocast::processor::render::PageRasterizer;
use lingocast::{
    Credentials, ExtractError, ServiceError, SpeechSynthesizer, TranscreationOutput, Transcreator,
};

/// Writes a placeholder image per page.
#[derive(Default)]
pub struct FakeRasterizer {
    pub calls: AtomicUsize,
    /// Scratch directory of the latest render.
    pub last_dir: Mutex<Option<PathBuf>>,
}

impl PageRasterizer for FakeRasterizer {
    fn render_page(
        &self,
        _pdf_path: &Path,
        page: u32,
        out_dir: &Path,
    ) -> Result<PathBuf, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_dir.lock().unwrap() = Some(out_dir.to_path_buf());
        let path = out_dir.join(format!("page-{}.png", page));
        std::fs::write(&path, page.to_string()).unwrap();
        Ok(path)
    }
}

/// Recognizes every page as the configured text, optionally taking `delay`
/// per page.
pub struct FakeOcr {
    pub text: String,
    pub calls: AtomicUsize,
    pub delay: Option<Duration>,
}

impl FakeOcr {
    pub fn new(text: &str) -> Self {
        Self {
            text: text.to_string(),
            calls: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn slow(text: &str, delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::new(text)
        }
    }
}

impl OcrEngine for FakeOcr {
    fn recognize(&self, _image_path: &Path) -> Result<String, ExtractError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        Ok(self.text.clone())
    }
}

/// Prefixes the input with the language; fails with `error` when set.
pub struct FakeTranscreator {
    pub calls: AtomicUsize,
    pub tokens: u32,
    pub error: Mutex<Option<ServiceError>>,
    pub last_input: Mutex<Option<String>>,
}

impl FakeTranscreator {
    pub fn new(tokens: u32) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            tokens,
            error: Mutex::new(None),
            last_input: Mutex::new(None),
        }
    }

    pub fn fail_with(&self, error: ServiceError) {
        *self.error.lock().unwrap() = Some(error);
    }

    pub fn recover(&self) {
        *self.error.lock().unwrap() = None;
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcreator for FakeTranscreator {
    async fn transcreate(
        &self,
        text: &str,
        target_language: &str,
        _credentials: &Credentials,
    ) -> Result<TranscreationOutput, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_input.lock().unwrap() = Some(text.to_string());
        if let Some(err) = self.error.lock().unwrap().clone() {
            return Err(err);
        }
        let first_words: Vec<&str> = text.split_whitespace().take(8).collect();
        Ok(TranscreationOutput {
            text: format!("[{}] {}", target_language, first_words.join(" ")),
            tokens_used: self.tokens,
        })
    }
}

/// Returns a fixed MP3-looking payload and records what it was asked to say.
pub struct FakeSynthesizer {
    pub calls: AtomicUsize,
    pub audio: Vec<u8>,
    pub last_request: Mutex<Option<(String, String)>>,
}

impl Default for FakeSynthesizer {
    fn default() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            audio: b"ID3\x04fake-mp3-frames".to_vec(),
            last_request: Mutex::new(None),
        }
    }
}

impl FakeSynthesizer {
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SpeechSynthesizer for FakeSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        _credentials: &Credentials,
    ) -> Result<Vec<u8>, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some((text.to_string(), voice_id.to_string()));
        Ok(self.audio.clone())
    }
}
