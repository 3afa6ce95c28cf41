use std::path::PathBuf;
use thiserror::Error;

/// Stable, outward-facing failure classification.
///
/// Every error the pipeline returns maps to exactly one kind, so callers can
/// decide how to react without inspecting message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad file type, missing fields, empty input. The user must fix the input.
    InputValidation,
    /// Upload exceeds the configured size limit.
    Size,
    /// Buffer is not a PDF at all.
    Format,
    /// PDF structure could not be parsed.
    Parse,
    /// Neither the text layer nor OCR produced usable text.
    Ocr,
    /// Upstream rejected the credentials.
    Auth,
    /// Upstream rate or credit limit reached.
    Quota,
    /// Upstream is temporarily unavailable.
    ServiceUnavailable,
    /// No voice is available for the requested language.
    Voice,
    /// Local store failure.
    Storage,
    /// Invalid configuration.
    Config,
    /// Anything else.
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InputValidation => "input_validation",
            ErrorKind::Size => "size",
            ErrorKind::Format => "format",
            ErrorKind::Parse => "parse",
            ErrorKind::Ocr => "ocr",
            ErrorKind::Auth => "auth",
            ErrorKind::Quota => "quota",
            ErrorKind::ServiceUnavailable => "service_unavailable",
            ErrorKind::Voice => "voice",
            ErrorKind::Storage => "storage",
            ErrorKind::Config => "config",
            ErrorKind::Internal => "internal",
        }
    }

    /// Quota errors may succeed later, unavailability may succeed right away.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Quota | ErrorKind::ServiceUnavailable)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum LingocastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid input: {0}")]
    InputValidation(String),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("{0}")]
    Service(#[from] ServiceError),

    #[error("Database error: {0}")]
    Database(#[from] crate::db::DatabaseError),

    #[error("Credentials error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl LingocastError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            LingocastError::Config(_) => ErrorKind::Config,
            LingocastError::InputValidation(_) => ErrorKind::InputValidation,
            LingocastError::Extract(e) => e.kind(),
            LingocastError::Service(e) => e.kind,
            LingocastError::Database(_) => ErrorKind::Storage,
            LingocastError::Secret(_) => ErrorKind::Auth,
            LingocastError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Human-readable message for the presentation layer.
    ///
    /// Parse and format failures are surfaced verbatim; OCR failures collapse
    /// to a single stable sentence.
    pub fn user_message(&self) -> String {
        match self {
            LingocastError::Extract(ExtractError::Ocr(_))
            | LingocastError::Extract(ExtractError::NoText)
            | LingocastError::Extract(ExtractError::OcrTimeout { .. }) => {
                "Could not extract text from the document.".to_string()
            }
            LingocastError::Service(e) => match e.kind {
                ErrorKind::Auth => format!("The {} API key was rejected.", e.service),
                ErrorKind::Quota => format!(
                    "The {} usage limit was reached. Please wait and try again later.",
                    e.service
                ),
                ErrorKind::ServiceUnavailable => format!(
                    "The {} service is temporarily unavailable. Please try again.",
                    e.service
                ),
                _ => e.message.clone(),
            },
            LingocastError::Secret(_) => "An API key is required.".to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("File is not a PDF (missing %PDF- header)")]
    Format,

    #[error("Failed to parse PDF: {0}")]
    Parse(String),

    #[error("File is too large: {size} bytes (limit {limit} bytes)")]
    Size { size: u64, limit: u64 },

    #[error("OCR failed: {0}")]
    Ocr(String),

    #[error("No text could be extracted from the document")]
    NoText,

    #[error("OCR timed out after {secs}s")]
    OcrTimeout { secs: u64 },
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::Format => ErrorKind::Format,
            ExtractError::Parse(_) => ErrorKind::Parse,
            ExtractError::Size { .. } => ErrorKind::Size,
            ExtractError::Ocr(_) | ExtractError::NoText | ExtractError::OcrTimeout { .. } => {
                ErrorKind::Ocr
            }
        }
    }
}

/// Failure reported by an external service adapter.
///
/// The adapter decides the kind from the HTTP status and the provider's
/// structured error code.
#[derive(Error, Debug, Clone)]
#[error("{service} error ({kind}): {message}")]
pub struct ServiceError {
    pub kind: ErrorKind,
    pub service: &'static str,
    pub message: String,
    pub status: Option<u16>,
}

impl ServiceError {
    pub fn new(kind: ErrorKind, service: &'static str, message: impl Into<String>) -> Self {
        Self {
            kind,
            service,
            message: message.into(),
            status: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }
}

pub type Result<T> = std::result::Result<T, LingocastError>;
