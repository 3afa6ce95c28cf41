//! Pipeline wired to an in-memory store and counting fakes.

#![allow(dead_code)]

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use lingocast::processor::fallback::OcrFallback;
use lingocast::{Config, Credentials, Database, Extractor, Pipeline};

use super::fakes::{FakeOcr, FakeRasterizer, FakeSynthesizer, FakeTranscreator};

/// Text the fake OCR engine "reads" from every page.
pub const OCR_TEXT: &str = "Scanned page text recognized by the OCR engine.";

pub struct TestHarness {
    pub pipeline: Pipeline,
    pub db: Database,
    pub rasterizer: Arc<FakeRasterizer>,
    pub ocr: Arc<FakeOcr>,
    pub transcreator: Arc<FakeTranscreator>,
    pub synthesizer: Arc<FakeSynthesizer>,
}

impl TestHarness {
    /// Default config, OCR fakes enabled.
    pub fn new() -> Self {
        Self::build(Config::default(), FakeOcr::new(OCR_TEXT), true)
    }

    pub fn with_config(config: Config) -> Self {
        Self::build(config, FakeOcr::new(OCR_TEXT), true)
    }

    /// OCR engine that recognizes `text` on every page.
    pub fn with_ocr_text(text: &str) -> Self {
        Self::build(Config::default(), FakeOcr::new(text), true)
    }

    /// OCR engine that spends `delay` on every page.
    pub fn with_slow_ocr(config: Config, delay: Duration) -> Self {
        Self::build(config, FakeOcr::slow(OCR_TEXT, delay), true)
    }

    pub fn without_ocr() -> Self {
        Self::build(Config::default(), FakeOcr::new(OCR_TEXT), false)
    }

    fn build(config: Config, ocr: FakeOcr, ocr_enabled: bool) -> Self {
        let db = Database::open_in_memory().expect("Failed to open in-memory database");
        let rasterizer = Arc::new(FakeRasterizer::default());
        let ocr = Arc::new(ocr);
        let transcreator = Arc::new(FakeTranscreator::new(321));
        let synthesizer = Arc::new(FakeSynthesizer::default());

        let fallback = ocr_enabled.then(|| {
            OcrFallback::new(rasterizer.clone(), ocr.clone(), config.ocr.page_limit)
        });
        let extractor = Extractor::new(
            config.extraction.page_limit,
            config.extraction.min_text_chars,
            fallback,
        );

        let pipeline = Pipeline::new(
            config,
            db.clone(),
            extractor,
            transcreator.clone(),
            synthesizer.clone(),
        );

        Self {
            pipeline,
            db,
            rasterizer,
            ocr,
            transcreator,
            synthesizer,
        }
    }

    pub fn credentials() -> Credentials {
        Credentials::new("sk-test-0123456789")
    }

    pub fn ocr_calls(&self) -> usize {
        self.ocr.calls.load(Ordering::SeqCst)
    }

    pub fn render_calls(&self) -> usize {
        self.rasterizer.calls.load(Ordering::SeqCst)
    }

    pub fn last_render_dir(&self) -> Option<std::path::PathBuf> {
        self.rasterizer.last_dir.lock().unwrap().clone()
    }
}
