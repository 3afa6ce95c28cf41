//! Transcreation through an OpenAI-compatible chat completions API.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};

use crate::config::TranscreationConfig;
use crate::error::{ErrorKind, ServiceError};
use crate::prompts::{transcreation_user_prompt, TRANSCREATION_SYSTEM_PROMPT};
use crate::secrets::Credentials;
use crate::services::{create_http_client, join_url, transport_error, truncate_error_body};

pub const SERVICE: &str = "transcreation";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscreationOutput {
    pub text: String,
    pub tokens_used: u32,
}

/// Localizes text into a target language.
#[async_trait]
pub trait Transcreator: Send + Sync {
    async fn transcreate(
        &self,
        text: &str,
        target_language: &str,
        credentials: &Credentials,
    ) -> Result<TranscreationOutput, ServiceError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

/// Maps an HTTP status and provider error code to an error kind.
///
/// The provider code wins over the status: OpenAI reports exhausted credit as
/// `429 insufficient_quota`, and invalid keys as `401 invalid_api_key`.
pub(crate) fn classify(status: u16, code: Option<&str>) -> ErrorKind {
    match code {
        Some("insufficient_quota") | Some("rate_limit_exceeded") => return ErrorKind::Quota,
        Some("invalid_api_key") | Some("invalid_organization") => return ErrorKind::Auth,
        _ => {}
    }
    match status {
        401 | 403 => ErrorKind::Auth,
        429 => ErrorKind::Quota,
        408 | 500..=599 => ErrorKind::ServiceUnavailable,
        _ => ErrorKind::Internal,
    }
}

fn error_from_response(status: u16, body: &str) -> ServiceError {
    let parsed = serde_json::from_str::<ApiErrorBody>(body).ok();
    let code = parsed
        .as_ref()
        .and_then(|b| b.error.code.as_deref().or(b.error.kind.as_deref()));
    let kind = classify(status, code);
    let message = parsed
        .as_ref()
        .and_then(|b| b.error.message.clone())
        .unwrap_or_else(|| truncate_error_body(body));
    ServiceError::new(kind, SERVICE, message).with_status(status)
}

/// Client for `POST {base_url}/chat/completions`.
pub struct OpenAiTranscreator {
    client: Client,
    endpoint: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiTranscreator {
    pub fn new(config: &TranscreationConfig) -> Result<Self, ServiceError> {
        Ok(Self {
            client: create_http_client(SERVICE, config.timeout_secs)?,
            endpoint: join_url(&config.base_url, "chat/completions"),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    fn request_body<'a>(&'a self, text: &str, target_language: &str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: TRANSCREATION_SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: transcreation_user_prompt(text, target_language),
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl Transcreator for OpenAiTranscreator {
    async fn transcreate(
        &self,
        text: &str,
        target_language: &str,
        credentials: &Credentials,
    ) -> Result<TranscreationOutput, ServiceError> {
        if credentials.ensure_present(SERVICE).is_err() {
            return Err(ServiceError::new(ErrorKind::Auth, SERVICE, "API key is empty"));
        }

        tracing::debug!(model = %self.model, language = target_language, "Requesting transcreation");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(credentials.api_key().expose_secret())
            .json(&self.request_body(text, target_language))
            .send()
            .await
            .map_err(|e| transport_error(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let err = error_from_response(status.as_u16(), &body);
            tracing::warn!(status = status.as_u16(), kind = %err.kind, "Transcreation request failed");
            return Err(err);
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            ServiceError::new(
                ErrorKind::ServiceUnavailable,
                SERVICE,
                format!("Failed to parse response: {}", e),
            )
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                ServiceError::new(
                    ErrorKind::ServiceUnavailable,
                    SERVICE,
                    "Response contained no text",
                )
            })?;

        Ok(TranscreationOutput {
            text,
            tokens_used: parsed.usage.map(|u| u.total_tokens).unwrap_or(0),
        })
    }
}
