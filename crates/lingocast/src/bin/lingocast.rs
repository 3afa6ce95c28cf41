//! CLI binary for lingocast.
//!
//! Thin shim over the library: each subcommand maps to one pipeline operation
//! and prints its result as text or JSON.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use base64::Engine;
use clap::{Parser, Subcommand};
use lingocast::config::{load_config, Config};
use lingocast::logging::{self, LogFormat};
use lingocast::pipeline::AUDIO_DATA_URI_PREFIX;
use lingocast::{Credentials, LingocastError, Pipeline};

#[derive(Parser, Debug)]
#[command(
    name = "lingocast",
    version,
    about = "Extract PDF text, transcreate it and narrate the result"
)]
struct Cli {
    /// JSON config file. Built-in defaults are used when omitted.
    #[arg(short, long, env = "LINGOCAST_CONFIG")]
    config: Option<PathBuf>,

    /// Override the database location from the config.
    #[arg(long, env = "LINGOCAST_DATABASE")]
    database: Option<PathBuf>,

    #[arg(long, env = "LINGOCAST_LOG_FORMAT", value_enum, default_value = "text")]
    log_format: LogFormat,

    /// Debug logging.
    #[arg(short, long)]
    verbose: bool,

    /// Print results as JSON.
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Extract the text of a PDF.
    Extract { file: PathBuf },

    /// Extract a PDF and transcreate its text.
    Transcreate {
        file: PathBuf,
        #[arg(short, long)]
        language: String,
        /// API key for the transcreation service (otherwise from config or env).
        #[arg(long, env = "LINGOCAST_TRANSCREATION_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Extract, transcreate and narrate a PDF, writing MP3 audio.
    Narrate {
        file: PathBuf,
        #[arg(short, long)]
        language: String,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long, env = "LINGOCAST_TRANSCREATION_KEY", hide_env_values = true)]
        api_key: Option<String>,
        #[arg(long, env = "LINGOCAST_SPEECH_KEY", hide_env_values = true)]
        speech_api_key: Option<String>,
    },

    /// Remove expired entries from the generic cache.
    PurgeCache,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(cli.log_format, if cli.verbose { "debug" } else { "info" });

    let mut config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(db) = &cli.database {
        config.database_path = Some(db.to_string_lossy().into_owned());
    }

    let pipeline = Pipeline::from_config(config.clone()).map_err(report)?;

    match cli.command {
        Command::Extract { file } => {
            let (bytes, name) = read_upload(&file)?;
            let result = pipeline
                .extract(&bytes, &name, bytes.len() as u64)
                .await
                .map_err(report)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                eprintln!(
                    "document {} | {} of {} pages | {} chars{}{}",
                    result.document_id,
                    result.extracted_page_count,
                    result.page_count,
                    result.extracted_length,
                    if result.was_truncated { " (truncated)" } else { "" },
                    if result.cached { " | cached" } else { "" },
                );
                println!("{}", result.text);
            }
        }

        Command::Transcreate {
            file,
            language,
            api_key,
        } => {
            let creds = credentials(api_key, || config.transcreation.credentials());
            let (bytes, name) = read_upload(&file)?;
            let doc = pipeline
                .extract(&bytes, &name, bytes.len() as u64)
                .await
                .map_err(report)?;
            let result = pipeline
                .transcreate(&doc.text, &language, Some(doc.document_id), &creds)
                .await
                .map_err(report)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                eprintln!(
                    "{} tokens{}",
                    result.tokens_used,
                    if result.cached { " | cached" } else { "" }
                );
                println!("{}", result.text);
            }
        }

        Command::Narrate {
            file,
            language,
            output,
            api_key,
            speech_api_key,
        } => {
            let llm_creds = credentials(api_key, || config.transcreation.credentials());
            let tts_creds = credentials(speech_api_key, || config.speech.credentials());
            let (bytes, name) = read_upload(&file)?;
            let doc = pipeline
                .extract(&bytes, &name, bytes.len() as u64)
                .await
                .map_err(report)?;
            let transcreation = pipeline
                .transcreate(&doc.text, &language, Some(doc.document_id), &llm_creds)
                .await
                .map_err(report)?;
            let audio = pipeline
                .synthesize(
                    &transcreation.text,
                    &language,
                    transcreation.transcreation_id,
                    &tts_creds,
                )
                .await
                .map_err(report)?;

            let payload = audio
                .audio
                .strip_prefix(AUDIO_DATA_URI_PREFIX)
                .context("Unexpected audio encoding")?;
            let mp3 = base64::engine::general_purpose::STANDARD.decode(payload)?;
            std::fs::write(&output, &mp3)
                .with_context(|| format!("Failed to write {}", output.display()))?;

            if cli.json {
                println!("{}", serde_json::to_string_pretty(&audio)?);
            } else {
                println!(
                    "Wrote {} bytes to {} (voice {}, {} chars{})",
                    mp3.len(),
                    output.display(),
                    audio.voice_id,
                    audio.characters_used,
                    if audio.cached { ", cached" } else { "" }
                );
            }
        }

        Command::PurgeCache => {
            let removed = pipeline.purge_expired_cache().await?;
            println!("Removed {} expired cache entries", removed);
        }
    }

    Ok(())
}

fn read_upload(path: &Path) -> Result<(Vec<u8>, String)> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .context("Input path has no file name")?;
    Ok((bytes, name))
}

/// Picks the key for a service. Resolution failures yield a blank key: cached
/// results need none, and the adapter rejects a blank key on a cache miss.
fn credentials(
    explicit: Option<String>,
    from_config: impl FnOnce() -> std::result::Result<Credentials, lingocast::SecretError>,
) -> Credentials {
    match explicit.filter(|k| !k.trim().is_empty()) {
        Some(key) => Credentials::new(key),
        None => from_config().unwrap_or_else(|e| {
            tracing::debug!(error = %e, "No API key resolved, continuing without one");
            Credentials::new("")
        }),
    }
}

/// Turns a pipeline error into its classified, user-facing form.
fn report(err: LingocastError) -> anyhow::Error {
    let kind = err.kind();
    tracing::debug!(error = %err, "Operation failed");
    if kind.is_retryable() {
        anyhow::anyhow!("[{}] {} (retryable)", kind, err.user_message())
    } else {
        anyhow::anyhow!("[{}] {}", kind, err.user_message())
    }
}
