//! Adapters for the external transcreation and speech services.
//!
//! Each adapter turns HTTP status codes and provider error codes into a
//! [`ServiceError`] with an explicit [`ErrorKind`].

use std::time::Duration;

use reqwest::Client;

use crate::error::{ErrorKind, ServiceError};

pub mod speech;
pub mod transcreation;

pub use speech::{ElevenLabsSynthesizer, SpeechSynthesizer};
pub use transcreation::{OpenAiTranscreator, TranscreationOutput, Transcreator};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Upper bound on provider error text kept in messages and logs.
const MAX_ERROR_BODY_LENGTH: usize = 200;

pub(crate) fn create_http_client(
    service: &'static str,
    timeout_secs: u64,
) -> Result<Client, ServiceError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| {
            ServiceError::new(
                ErrorKind::Internal,
                service,
                format!("Failed to create HTTP client: {}", e),
            )
        })
}

/// Network-level failures are always treated as transient.
pub(crate) fn transport_error(service: &'static str, e: reqwest::Error) -> ServiceError {
    let message = if e.is_timeout() {
        format!("Request timed out: {}", e)
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else {
        format!("Request failed: {}", e)
    };
    ServiceError::new(ErrorKind::ServiceUnavailable, service, message)
}

pub(crate) fn truncate_error_body(body: &str) -> String {
    if body.chars().count() > MAX_ERROR_BODY_LENGTH {
        let head: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
        format!("{}... (truncated)", head)
    } else {
        body.to_string()
    }
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}
