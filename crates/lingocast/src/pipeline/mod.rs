//! The three pipeline operations: extract, transcreate and synthesize.
//!
//! Each operation checks the store first and only does expensive work on a
//! miss. The store, extractor and service adapters are injected, so the same
//! façade runs against real services or test doubles.

pub mod results;
pub mod validate;

use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use tracing::Instrument;

use crate::config::Config;
use crate::db::{
    audio_repo, cache_repo, document_repo, transcreation_repo, Database, DatabaseError,
};
use crate::error::{ErrorKind, ExtractError, LingocastError, Result, ServiceError};
use crate::processor::fallback::CancelToken;
use crate::processor::pdf::TextLayer;
use crate::processor::{Extraction, Extractor, TextSource};
use crate::sanitize::redact_filename;
use crate::secrets::Credentials;
use crate::services::{
    speech, ElevenLabsSynthesizer, OpenAiTranscreator, SpeechSynthesizer, Transcreator,
};
use crate::text::{normalize, truncate, TruncationPolicy};

pub use results::{
    audio_data_uri, ExtractResult, SynthesizeResult, TranscreateResult, AUDIO_DATA_URI_PREFIX,
};
pub use validate::validate_upload;

#[derive(Clone)]
pub struct Pipeline {
    config: Arc<Config>,
    db: Database,
    extractor: Extractor,
    transcreator: Arc<dyn Transcreator>,
    synthesizer: Arc<dyn SpeechSynthesizer>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        db: Database,
        extractor: Extractor,
        transcreator: Arc<dyn Transcreator>,
        synthesizer: Arc<dyn SpeechSynthesizer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            db,
            extractor,
            transcreator,
            synthesizer,
        }
    }

    /// Opens the configured database and builds the production adapters.
    pub fn from_config(config: Config) -> Result<Self> {
        let path = config.database_path().ok_or_else(|| {
            LingocastError::Internal("Could not determine a database location".to_string())
        })?;
        let db = Database::open(&path)?;
        let extractor = Extractor::from_config(&config);
        let transcreator = Arc::new(OpenAiTranscreator::new(&config.transcreation)?);
        let synthesizer = Arc::new(ElevenLabsSynthesizer::new(&config.speech)?);
        Ok(Self::new(config, db, extractor, transcreator, synthesizer))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    fn extraction_policy(&self) -> TruncationPolicy {
        TruncationPolicy::extraction(self.config.extraction.text_budget)
    }

    /// Extracts the text of an uploaded PDF, reusing an earlier extraction of
    /// the same (filename, size) pair.
    pub async fn extract(&self, bytes: &[u8], filename: &str, size: u64) -> Result<ExtractResult> {
        let span = tracing::info_span!("pipeline.extract", file = %redact_filename(filename), size);
        self.extract_inner(bytes, filename, size).instrument(span).await
    }

    async fn extract_inner(&self, bytes: &[u8], filename: &str, size: u64) -> Result<ExtractResult> {
        validate_upload(filename, bytes, size, self.config.extraction.max_upload_bytes)?;

        let name = filename.to_string();
        let cached = {
            let name = name.clone();
            self.db
                .call(move |db| document_repo::find_by_name_and_size(db, &name, size))
                .await?
        };
        if let Some(row) = cached {
            tracing::info!(document_id = row.id, "Document cache hit");
            let truncation = truncate(&row.extracted_text, &self.extraction_policy());
            return Ok(ExtractResult {
                text: truncation.text,
                page_count: row.page_count as u32,
                extracted_page_count: row.extracted_pages as u32,
                original_length: truncation.original_length,
                extracted_length: truncation.final_length,
                was_truncated: truncation.was_truncated,
                document_id: row.id,
                cached: true,
                text_source: TextSource::parse(&row.text_source).unwrap_or(TextSource::TextLayer),
            });
        }

        let bytes: Arc<[u8]> = Arc::from(bytes);

        let layer = {
            let extractor = self.extractor.clone();
            let bytes = bytes.clone();
            tokio::task::spawn_blocking(move || extractor.text_layer(&bytes))
                .await
                .map_err(|e| LingocastError::Internal(format!("Extraction task failed: {}", e)))??
        };

        let extraction = if self.extractor.will_run_ocr(&layer) {
            self.complete_with_timeout(layer, bytes, name.clone()).await?
        } else {
            self.extractor
                .complete(layer, &bytes, &name, &CancelToken::new())?
        };

        let normalized = normalize(&extraction.text);
        if normalized.is_empty() {
            return Err(ExtractError::NoText.into());
        }

        let row = {
            let normalized = normalized.clone();
            let source = extraction.source;
            let (page_count, extracted_pages) = (extraction.page_count, extraction.extracted_pages);
            self.db
                .call(move |db| {
                    document_repo::insert(
                        db,
                        &document_repo::NewDocument {
                            original_filename: &name,
                            file_size: size,
                            extracted_text: &normalized,
                            page_count,
                            extracted_pages,
                            text_source: source.as_str(),
                        },
                    )
                })
                .await?
        };

        let truncation = truncate(&normalized, &self.extraction_policy());
        tracing::info!(
            document_id = row.id,
            source = extraction.source.as_str(),
            chars = truncation.final_length,
            truncated = truncation.was_truncated,
            "Document extracted"
        );

        Ok(ExtractResult {
            text: truncation.text,
            page_count: extraction.page_count,
            extracted_page_count: extraction.extracted_pages,
            original_length: truncation.original_length,
            extracted_length: truncation.final_length,
            was_truncated: truncation.was_truncated,
            document_id: row.id,
            cached: false,
            text_source: extraction.source,
        })
    }

    /// Runs the OCR-backed completion on the blocking pool, bounded by
    /// `ocr.timeout_secs`.
    ///
    /// On timeout the blocking run cannot be killed: it is cancelled, finishes
    /// the page it is on, then drops its scratch directory.
    async fn complete_with_timeout(
        &self,
        layer: TextLayer,
        bytes: Arc<[u8]>,
        name: String,
    ) -> Result<Extraction> {
        let secs = self.config.ocr.timeout_secs;
        let cancel = CancelToken::new();
        let task = {
            let extractor = self.extractor.clone();
            let cancel = cancel.clone();
            tokio::task::spawn_blocking(move || extractor.complete(layer, &bytes, &name, &cancel))
        };

        match tokio::time::timeout(Duration::from_secs(secs), task).await {
            Ok(joined) => Ok(joined
                .map_err(|e| LingocastError::Internal(format!("OCR task failed: {}", e)))??),
            Err(_) => {
                cancel.cancel();
                tracing::warn!(timeout_secs = secs, "OCR fallback timed out");
                Err(ExtractError::OcrTimeout { secs }.into())
            }
        }
    }

    /// Transcreates `text` into `target_language`.
    ///
    /// With a `document_id`, the newest stored transcreation for that
    /// (document, language) pair is returned if one exists, and a fresh
    /// result is stored otherwise.
    pub async fn transcreate(
        &self,
        text: &str,
        target_language: &str,
        document_id: Option<i64>,
        credentials: &Credentials,
    ) -> Result<TranscreateResult> {
        let target_language = target_language.trim();
        let span = tracing::info_span!(
            "pipeline.transcreate",
            language = target_language,
            document_id
        );
        self.transcreate_inner(text, target_language, document_id, credentials)
            .instrument(span)
            .await
    }

    async fn transcreate_inner(
        &self,
        text: &str,
        target_language: &str,
        document_id: Option<i64>,
        credentials: &Credentials,
    ) -> Result<TranscreateResult> {
        validate::require_non_blank("text", text)?;
        validate::require_non_blank("target language", target_language)?;

        if let Some(doc_id) = document_id {
            let language = target_language.to_string();
            let cached = self
                .db
                .call(move |db| {
                    if document_repo::find_by_id(db, doc_id)?.is_none() {
                        return Ok(None);
                    }
                    transcreation_repo::find_latest(db, doc_id, &language).map(Some)
                })
                .await?;
            match cached {
                None => {
                    return Err(LingocastError::InputValidation(format!(
                        "Unknown document {}",
                        doc_id
                    )))
                }
                Some(Some(row)) => {
                    tracing::info!(transcreation_id = row.id, "Transcreation cache hit");
                    return Ok(TranscreateResult {
                        text: row.transcreated_text,
                        transcreation_id: Some(row.id),
                        tokens_used: 0,
                        cached: true,
                    });
                }
                Some(None) => {}
            }
        }

        let input = truncate(text.trim(), &self.extraction_policy());
        let output = self
            .transcreator
            .transcreate(&input.text, target_language, credentials)
            .await?;

        let transcreation_id = match document_id {
            Some(doc_id) => {
                let language = target_language.to_string();
                let transcreated = output.text.clone();
                let tokens_used = output.tokens_used;
                let original_length = input.original_length;
                let row = self
                    .db
                    .call(move |db| {
                        let row = transcreation_repo::insert(
                            db,
                            &transcreation_repo::NewTranscreation {
                                document_id: doc_id,
                                target_language: &language,
                                transcreated_length: transcreated.chars().count(),
                                transcreated_text: &transcreated,
                                original_length,
                                tokens_used,
                            },
                        )?;
                        document_repo::update_status(db, doc_id, document_repo::STATUS_TRANSCREATED)?;
                        Ok(row)
                    })
                    .await?;
                Some(row.id)
            }
            None => None,
        };

        tracing::info!(tokens = output.tokens_used, ?transcreation_id, "Transcreation complete");

        Ok(TranscreateResult {
            text: output.text,
            transcreation_id,
            tokens_used: output.tokens_used,
            cached: false,
        })
    }

    /// Narrates `text` with the voice mapped to `language`.
    ///
    /// With a `transcreation_id`, the newest stored audio for it is returned if
    /// one exists, and fresh audio is stored otherwise.
    pub async fn synthesize(
        &self,
        text: &str,
        language: &str,
        transcreation_id: Option<i64>,
        credentials: &Credentials,
    ) -> Result<SynthesizeResult> {
        let language = language.trim();
        let span = tracing::info_span!("pipeline.synthesize", language, transcreation_id);
        self.synthesize_inner(text, language, transcreation_id, credentials)
            .instrument(span)
            .await
    }

    async fn synthesize_inner(
        &self,
        text: &str,
        language: &str,
        transcreation_id: Option<i64>,
        credentials: &Credentials,
    ) -> Result<SynthesizeResult> {
        validate::require_non_blank("text", text)?;
        validate::require_non_blank("language", language)?;

        // (transcreation id, owning document id)
        let mut owner: Option<(i64, i64)> = None;
        if let Some(id) = transcreation_id {
            let lookup = self
                .db
                .call(move |db| {
                    Ok(match transcreation_repo::find_by_id(db, id)? {
                        Some(t) => Some((t.document_id, audio_repo::find_latest(db, id)?)),
                        None => None,
                    })
                })
                .await?;
            match lookup {
                None => {
                    return Err(LingocastError::InputValidation(format!(
                        "Unknown transcreation {}",
                        id
                    )))
                }
                Some((_, Some(row))) => {
                    tracing::info!(audio_id = row.id, "Audio cache hit");
                    return Ok(SynthesizeResult {
                        audio: audio_data_uri(&row.audio_base64),
                        audio_size: row.byte_size as usize,
                        characters_used: 0,
                        voice_id: row.voice_id,
                        audio_id: Some(row.id),
                        cached: true,
                        truncation: None,
                    });
                }
                Some((document_id, None)) => owner = Some((id, document_id)),
            }
        }

        let voice_id = self
            .config
            .speech
            .voice_for(language)
            .ok_or_else(|| {
                ServiceError::new(
                    ErrorKind::Voice,
                    speech::SERVICE,
                    format!("No voice is configured for {}", language),
                )
            })?
            .to_string();

        let truncation = truncate(
            text.trim(),
            &TruncationPolicy::speech(self.config.speech.text_budget),
        );
        if truncation.was_truncated {
            tracing::info!(
                original = truncation.original_length,
                kept = truncation.final_length,
                "Text shortened for speech"
            );
        }

        let audio = self
            .synthesizer
            .synthesize(&truncation.text, &voice_id, credentials)
            .await?;
        let encoded = base64::engine::general_purpose::STANDARD.encode(&audio);
        let data_uri = audio_data_uri(&encoded);

        let audio_id = match owner {
            Some((id, document_id)) => {
                let language = language.to_string();
                let voice = voice_id.clone();
                let byte_size = audio.len();
                let characters_used = truncation.final_length;
                let row = self
                    .db
                    .call(move |db| {
                        let row = audio_repo::insert(
                            db,
                            &audio_repo::NewAudio {
                                transcreation_id: id,
                                language: &language,
                                voice_id: &voice,
                                byte_size,
                                audio_base64: &encoded,
                                characters_used,
                            },
                        )?;
                        document_repo::update_status(db, document_id, document_repo::STATUS_NARRATED)?;
                        Ok(row)
                    })
                    .await?;
                Some(row.id)
            }
            None => None,
        };

        tracing::info!(bytes = audio.len(), ?audio_id, "Speech complete");

        Ok(SynthesizeResult {
            audio: data_uri,
            audio_size: audio.len(),
            characters_used: truncation.final_length,
            voice_id,
            audio_id,
            cached: false,
            truncation: Some(truncation),
        })
    }

    /// Removes expired entries from the generic cache.
    pub async fn purge_expired_cache(&self) -> std::result::Result<usize, DatabaseError> {
        self.db.call(cache_repo::purge_expired).await
    }
}
