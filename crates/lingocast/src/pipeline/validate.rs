//! Upload and request validation.

use crate::error::{ExtractError, LingocastError, Result};

const PDF_MIME: &str = "application/pdf";

/// Checks an upload before any parsing happens.
///
/// `declared_size` is what the client claims; it must match the buffer.
pub fn validate_upload(
    filename: &str,
    bytes: &[u8],
    declared_size: u64,
    max_bytes: u64,
) -> Result<()> {
    if filename.trim().is_empty() {
        return Err(LingocastError::InputValidation(
            "A filename is required".to_string(),
        ));
    }

    let guessed = mime_guess::from_path(filename).first_raw();
    if guessed != Some(PDF_MIME) {
        return Err(LingocastError::InputValidation(format!(
            "Only PDF files are supported (got {})",
            guessed.unwrap_or("unknown type")
        )));
    }

    if bytes.is_empty() {
        return Err(LingocastError::InputValidation("The file is empty".to_string()));
    }

    let actual = bytes.len() as u64;
    if actual > max_bytes {
        return Err(ExtractError::Size {
            size: actual,
            limit: max_bytes,
        }
        .into());
    }

    if declared_size != actual {
        return Err(LingocastError::InputValidation(format!(
            "Declared size {} does not match received {} bytes",
            declared_size, actual
        )));
    }

    Ok(())
}

/// Rejects blank required text fields.
pub fn require_non_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LingocastError::InputValidation(format!("{} is required", field)));
    }
    Ok(())
}
