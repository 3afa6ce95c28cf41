pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod pipeline;
pub mod processor;
pub mod prompts;
pub mod sanitize;
pub mod secrets;
pub mod services;
pub mod text;

pub use config::{load_config, Config};
pub use db::{Database, DatabaseError};
pub use error::{ConfigError, ErrorKind, ExtractError, LingocastError, Result, ServiceError};
pub use pipeline::{ExtractResult, Pipeline, SynthesizeResult, TranscreateResult};
pub use processor::{Extractor, TextSource};
pub use secrets::{resolve_secret, Credentials, SecretError};
pub use services::{SpeechSynthesizer, TranscreationOutput, Transcreator};
