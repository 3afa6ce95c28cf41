//! Page rasterization for the OCR fallback.

use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::ExtractError;

/// Renders a single PDF page to an image file.
pub trait PageRasterizer: Send + Sync {
    /// Renders 1-based `page` of the PDF at `pdf_path` into `out_dir` and
    /// returns the path of the written image.
    fn render_page(&self, pdf_path: &Path, page: u32, out_dir: &Path)
        -> Result<PathBuf, ExtractError>;
}

/// Rasterizer backed by poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct Pdftoppm {
    binary: PathBuf,
    dpi: u32,
}

impl Pdftoppm {
    pub fn new(dpi: u32) -> Self {
        Self {
            binary: PathBuf::from("pdftoppm"),
            dpi,
        }
    }

    pub fn with_binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    pub fn dpi(&self) -> u32 {
        self.dpi
    }

    fn args(&self, pdf_path: &Path, page: u32, prefix: &Path) -> Vec<String> {
        vec![
            "-png".to_string(),
            "-r".to_string(),
            self.dpi.to_string(),
            "-f".to_string(),
            page.to_string(),
            "-l".to_string(),
            page.to_string(),
            "-singlefile".to_string(),
            pdf_path.to_string_lossy().into_owned(),
            prefix.to_string_lossy().into_owned(),
        ]
    }
}

impl PageRasterizer for Pdftoppm {
    fn render_page(
        &self,
        pdf_path: &Path,
        page: u32,
        out_dir: &Path,
    ) -> Result<PathBuf, ExtractError> {
        let prefix = out_dir.join(format!("page-{}", uuid::Uuid::new_v4()));

        let output = Command::new(&self.binary)
            .args(self.args(pdf_path, page, &prefix))
            .output()
            .map_err(|e| {
                ExtractError::Ocr(format!(
                    "Failed to run pdftoppm: {}. Make sure poppler-utils is installed.",
                    e
                ))
            })?;

        if !output.status.success() {
            return Err(ExtractError::Ocr(format!(
                "pdftoppm failed on page {}: {}",
                page,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }

        find_rendered_page(&prefix).ok_or_else(|| {
            ExtractError::Ocr(format!("Rendered image for page {} not found", page))
        })
    }
}

/// With `-singlefile`, pdftoppm writes `<prefix>.png` with no page suffix,
/// whatever the document's page count.
fn find_rendered_page(prefix: &Path) -> Option<PathBuf> {
    let path = PathBuf::from(format!("{}.png", prefix.display()));
    path.exists().then_some(path)
}
