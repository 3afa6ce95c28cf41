use std::io::Cursor;
use std::path::Path;

use crate::error::ExtractError;

/// Recognizes text in a rendered page image.
pub trait OcrEngine: Send + Sync {
    fn recognize(&self, image_path: &Path) -> Result<String, ExtractError>;
}

/// Tesseract via leptess. A fresh engine is created per image so the type is
/// freely shareable across threads.
#[derive(Debug, Clone)]
pub struct TesseractOcr {
    languages: String,
    page_seg_mode: u32,
}

impl TesseractOcr {
    pub fn new(languages: &[String], page_seg_mode: u32) -> Self {
        let languages = if languages.is_empty() {
            "eng".to_string()
        } else {
            languages.join("+")
        };
        Self {
            languages,
            page_seg_mode,
        }
    }

    pub fn languages(&self) -> &str {
        &self.languages
    }

    pub fn recognize_bytes(&self, image_data: &[u8]) -> Result<String, ExtractError> {
        let _span = tracing::info_span!("processor.ocr", languages = %self.languages).entered();

        let img = image::load_from_memory(image_data)
            .map_err(|e| ExtractError::Ocr(format!("Failed to load image: {}", e)))?;

        let mut png_data = Vec::new();
        img.write_to(&mut Cursor::new(&mut png_data), image::ImageFormat::Png)
            .map_err(|e| ExtractError::Ocr(format!("Failed to convert image: {}", e)))?;

        let mut lt = leptess::LepTess::new(None, &self.languages)
            .map_err(|e| ExtractError::Ocr(format!("Failed to initialize Tesseract: {}", e)))?;

        lt.set_variable(
            leptess::Variable::TesseditPagesegMode,
            &self.page_seg_mode.to_string(),
        )
        .map_err(|e| ExtractError::Ocr(format!("Failed to set page segmentation mode: {}", e)))?;

        lt.set_image_from_mem(&png_data)
            .map_err(|e| ExtractError::Ocr(format!("Failed to set image for OCR: {}", e)))?;

        lt.get_utf8_text()
            .map_err(|e| ExtractError::Ocr(format!("OCR failed: {}", e)))
    }
}

impl OcrEngine for TesseractOcr {
    fn recognize(&self, image_path: &Path) -> Result<String, ExtractError> {
        let data = std::fs::read(image_path).map_err(|e| {
            ExtractError::Ocr(format!(
                "Failed to read rendered image '{}': {}",
                image_path.display(),
                e
            ))
        })?;
        self.recognize_bytes(&data)
    }
}
