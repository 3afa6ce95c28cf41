use std::path::PathBuf;
use thiserror::Error;

/// Failures of the SQLite store behind documents, transcreations and audio.
#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Store query failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// The directory that should hold the database file could not be created.
    #[error("Cannot create store directory '{path}': {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Schema migration {version} failed: {reason}")]
    Migration { version: u32, reason: String },

    /// A thread panicked while holding the connection.
    #[error("Store connection is unusable after a panic")]
    LockPoisoned,

    /// The blocking worker running a store call did not complete.
    #[error("Store worker failed: {0}")]
    Worker(String),
}
