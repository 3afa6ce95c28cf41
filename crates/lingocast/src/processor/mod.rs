pub mod fallback;
pub mod ocr;
pub mod pdf;
pub mod render;

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ExtractError;
use crate::processor::fallback::{CancelToken, OcrFallback};
use crate::processor::ocr::TesseractOcr;
use crate::processor::pdf::TextLayer;
use crate::processor::render::Pdftoppm;

/// Where the extracted text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    TextLayer,
    Ocr,
}

impl TextSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextSource::TextLayer => "text_layer",
            TextSource::Ocr => "ocr",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text_layer" => Some(TextSource::TextLayer),
            "ocr" => Some(TextSource::Ocr),
            _ => None,
        }
    }
}

/// Raw extraction output, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub text: String,
    pub page_count: u32,
    pub extracted_pages: u32,
    pub source: TextSource,
}

/// Text layer first, OCR when the text layer is too thin.
#[derive(Clone)]
pub struct Extractor {
    page_limit: u32,
    min_text_chars: usize,
    ocr: Option<OcrFallback>,
}

impl Extractor {
    pub fn new(page_limit: u32, min_text_chars: usize, ocr: Option<OcrFallback>) -> Self {
        Self {
            page_limit,
            min_text_chars,
            ocr,
        }
    }

    /// Builds the production extractor: pdftoppm + Tesseract when OCR is enabled.
    pub fn from_config(config: &Config) -> Self {
        let ocr = config.ocr.enabled.then(|| {
            OcrFallback::new(
                Arc::new(Pdftoppm::new(config.ocr.dpi)),
                Arc::new(TesseractOcr::new(
                    &config.ocr.languages,
                    config.ocr.page_seg_mode,
                )),
                config.ocr.page_limit,
            )
        });
        Self::new(
            config.extraction.page_limit,
            config.extraction.min_text_chars,
            ocr,
        )
    }

    pub fn text_layer(&self, bytes: &[u8]) -> Result<TextLayer, ExtractError> {
        pdf::extract_text_layer(bytes, self.page_limit)
    }

    /// Whether text-layer output is below the minimal-content threshold.
    pub fn needs_ocr(&self, text: &str) -> bool {
        text.trim().chars().count() < self.min_text_chars
    }

    /// Whether [`Extractor::complete`] will run the OCR fallback for `layer`.
    pub fn will_run_ocr(&self, layer: &TextLayer) -> bool {
        self.ocr.is_some() && self.needs_ocr(&layer.text)
    }

    /// Settles the final text once the text layer has been read, running the
    /// OCR fallback first when the layer is too thin and OCR is enabled.
    ///
    /// Blocking. `cancel` lets a caller that stopped waiting end the fallback
    /// early.
    pub fn complete(
        &self,
        layer: TextLayer,
        bytes: &[u8],
        name: &str,
        cancel: &CancelToken,
    ) -> Result<Extraction, ExtractError> {
        let ocr_text = match &self.ocr {
            Some(ocr) if self.needs_ocr(&layer.text) => {
                tracing::info!(
                    chars = layer.text.trim().chars().count(),
                    threshold = self.min_text_chars,
                    "Text layer too thin, running OCR fallback"
                );
                Some(ocr.run(bytes, name, Some(layer.page_count), cancel)?)
            }
            _ => None,
        };

        let (text, source) = match ocr_text {
            Some(text) => (text, TextSource::Ocr),
            None => (layer.text, TextSource::TextLayer),
        };

        if text.trim().is_empty() {
            return Err(ExtractError::NoText);
        }

        Ok(Extraction {
            text,
            page_count: layer.page_count,
            extracted_pages: layer.extracted_pages,
            source,
        })
    }

    /// Text layer plus [`Extractor::complete`], synchronously.
    pub fn extract(&self, bytes: &[u8], name: &str) -> Result<Extraction, ExtractError> {
        let layer = self.text_layer(bytes)?;
        self.complete(layer, bytes, name, &CancelToken::new())
    }
}
