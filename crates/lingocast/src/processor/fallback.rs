//! OCR fallback for PDFs without a usable text layer.
//!
//! The buffer is written into a scoped temporary directory, the first pages are
//! rasterized and recognized one at a time, and every image is removed as soon
//! as it has been read. The directory itself is removed when the run ends,
//! whether it succeeds, fails or unwinds.
//!
//! A blocking run cannot be aborted from outside, so callers that give up on
//! it (a timeout) flip a [`CancelToken`]; the run stops before the next page
//! and its scratch directory goes away with it.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::error::ExtractError;
use crate::processor::ocr::OcrEngine;
use crate::processor::render::PageRasterizer;
use crate::sanitize::redact_filename;

/// Stop flag shared between a blocking OCR run and whoever waits on it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone)]
pub struct OcrFallback {
    rasterizer: Arc<dyn PageRasterizer>,
    engine: Arc<dyn OcrEngine>,
    page_limit: u32,
}

impl OcrFallback {
    pub fn new(
        rasterizer: Arc<dyn PageRasterizer>,
        engine: Arc<dyn OcrEngine>,
        page_limit: u32,
    ) -> Self {
        Self {
            rasterizer,
            engine,
            page_limit,
        }
    }

    pub fn page_limit(&self) -> u32 {
        self.page_limit
    }

    /// Recognizes the first pages of `pdf_bytes`.
    ///
    /// Per-page failures are logged and skipped. Returns an empty string when
    /// no page produced text; fails only when the scratch space cannot be set up.
    /// Once `cancel` is set, no further page is started.
    pub fn run(
        &self,
        pdf_bytes: &[u8],
        name: &str,
        page_count: Option<u32>,
        cancel: &CancelToken,
    ) -> Result<String, ExtractError> {
        let _span = tracing::info_span!(
            "processor.ocr_fallback",
            file = %redact_filename(name),
            page_limit = self.page_limit
        )
        .entered();

        let scratch = tempfile::Builder::new()
            .prefix("lingocast-ocr-")
            .tempdir()
            .map_err(|e| ExtractError::Ocr(format!("Failed to create temp dir: {}", e)))?;

        let pdf_path = scratch.path().join("input.pdf");
        std::fs::write(&pdf_path, pdf_bytes)
            .map_err(|e| ExtractError::Ocr(format!("Failed to write temp PDF: {}", e)))?;

        let last_page = page_count
            .map(|count| count.min(self.page_limit))
            .unwrap_or(self.page_limit);

        let mut parts = Vec::new();
        for page in 1..=last_page {
            if cancel.is_cancelled() {
                tracing::warn!(page, "OCR cancelled, remaining pages skipped");
                break;
            }
            match self.recognize_page(&pdf_path, page, scratch.path()) {
                Ok(text) => {
                    let text = text.trim();
                    if text.is_empty() {
                        tracing::debug!(page, "OCR produced no text");
                    } else {
                        parts.push(text.to_string());
                    }
                }
                Err(e) => {
                    tracing::warn!(page, error = %e, "OCR failed for page, skipping");
                }
            }
        }

        tracing::info!(
            pages_with_text = parts.len(),
            pages_tried = last_page,
            "OCR fallback finished"
        );

        Ok(parts.join("\n\n"))
    }

    fn recognize_page(
        &self,
        pdf_path: &Path,
        page: u32,
        scratch: &Path,
    ) -> Result<String, ExtractError> {
        let image_path = self.rasterizer.render_page(pdf_path, page, scratch)?;
        let result = self.engine.recognize(&image_path);
        if let Err(e) = std::fs::remove_file(&image_path) {
            tracing::debug!(page, error = %e, "Failed to remove rendered page");
        }
        result
    }
}
