//! Text-to-speech through an ElevenLabs-style API.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::SpeechConfig;
use crate::error::{ErrorKind, ServiceError};
use crate::secrets::Credentials;
use crate::services::{create_http_client, join_url, transport_error, truncate_error_body};

pub const SERVICE: &str = "speech";

/// Turns text into encoded audio (MP3) using a given voice.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        credentials: &Credentials,
    ) -> Result<Vec<u8>, ServiceError>;
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    text: &'a str,
    model_id: &'a str,
    voice_settings: VoiceSettings,
}

#[derive(Debug, Clone, Copy, Serialize)]
struct VoiceSettings {
    stability: f32,
    similarity_boost: f32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    detail: ApiErrorDetail,
}

/// `detail` is an object for structured errors and a plain string otherwise.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ApiErrorDetail {
    Structured {
        #[serde(default)]
        status: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
    Text(String),
}

pub(crate) fn classify(status: u16, code: Option<&str>) -> ErrorKind {
    match code {
        Some("quota_exceeded") | Some("too_many_concurrent_requests") => return ErrorKind::Quota,
        Some("invalid_api_key") | Some("missing_permissions") => return ErrorKind::Auth,
        Some("voice_not_found") | Some("voice_not_fine_tuned") => return ErrorKind::Voice,
        Some("system_busy") => return ErrorKind::ServiceUnavailable,
        _ => {}
    }
    match status {
        401 | 403 => ErrorKind::Auth,
        404 => ErrorKind::Voice,
        429 => ErrorKind::Quota,
        408 | 500..=599 => ErrorKind::ServiceUnavailable,
        _ => ErrorKind::Internal,
    }
}

fn error_from_response(status: u16, body: &str) -> ServiceError {
    let (code, message) = match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(ApiErrorBody {
            detail: ApiErrorDetail::Structured { status, message },
        }) => (status, message),
        Ok(ApiErrorBody {
            detail: ApiErrorDetail::Text(message),
        }) => (None, Some(message)),
        Err(_) => (None, None),
    };
    let kind = classify(status, code.as_deref());
    let message = message.unwrap_or_else(|| truncate_error_body(body));
    ServiceError::new(kind, SERVICE, message).with_status(status)
}

/// Client for `POST {base_url}/text-to-speech/{voice_id}`.
pub struct ElevenLabsSynthesizer {
    client: Client,
    base_url: String,
    model_id: String,
    output_format: String,
    settings: VoiceSettings,
}

impl ElevenLabsSynthesizer {
    pub fn new(config: &SpeechConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            client: create_http_client(SERVICE, config.timeout_secs)?,
            base_url: config.base_url.clone(),
            model_id: config.model_id.clone(),
            output_format: config.output_format.clone(),
            settings: VoiceSettings {
                stability: config.stability,
                similarity_boost: config.similarity_boost,
            },
        })
    }

    fn endpoint(&self, voice_id: &str) -> String {
        join_url(&self.base_url, &format!("text-to-speech/{}", voice_id))
    }

    fn request_body<'a>(&'a self, text: &'a str) -> SpeechRequest<'a> {
        SpeechRequest {
            text,
            model_id: &self.model_id,
            voice_settings: self.settings,
        }
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsSynthesizer {
    async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        credentials: &Credentials,
    ) -> Result<Vec<u8>, ServiceError> {
        if credentials.ensure_present(SERVICE).is_err() {
            return Err(ServiceError::new(ErrorKind::Auth, SERVICE, "API key is empty"));
        }
        if voice_id.trim().is_empty() {
            return Err(ServiceError::new(ErrorKind::Voice, SERVICE, "No voice selected"));
        }

        tracing::debug!(voice_id, chars = text.chars().count(), "Requesting speech");

        let response = self
            .client
            .post(self.endpoint(voice_id))
            .query(&[("output_format", self.output_format.as_str())])
            .header("xi-api-key", credentials.api_key().expose_secret())
            .header(reqwest::header::ACCEPT, "audio/mpeg")
            .json(&self.request_body(text))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = error_from_response(status.as_u16(), &body);
            tracing::warn!(status = status.as_u16(), kind = %err.kind, "Speech request failed");
            return Err(err);
        }

        let audio = response
            .bytes()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        if audio.is_empty() {
            return Err(ServiceError::new(
                ErrorKind::ServiceUnavailable,
                SERVICE,
                "Service returned empty audio",
            ));
        }

        Ok(audio.to_vec())
    }
}
