//! Audio repository for the `audio_files` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{now_timestamp, Database, DatabaseError};

/// Stored narration. Audio bytes are kept base64-encoded.
#[derive(Debug, Clone)]
pub struct AudioRow {
    pub id: i64,
    pub transcreation_id: i64,
    pub language: String,
    pub voice_id: String,
    pub byte_size: i64,
    pub audio_base64: String,
    pub characters_used: i64,
    pub created_at: String,
}

impl AudioRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            transcreation_id: row.get("transcreation_id")?,
            language: row.get("language")?,
            voice_id: row.get("voice_id")?,
            byte_size: row.get("byte_size")?,
            audio_base64: row.get("audio_base64")?,
            characters_used: row.get("characters_used")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewAudio<'a> {
    pub transcreation_id: i64,
    pub language: &'a str,
    pub voice_id: &'a str,
    pub byte_size: usize,
    pub audio_base64: &'a str,
    pub characters_used: usize,
}

pub fn insert(db: &Database, audio: &NewAudio<'_>) -> Result<AudioRow, DatabaseError> {
    let now = now_timestamp();
    let id = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO audio_files (transcreation_id, language, voice_id, byte_size,
             audio_base64, characters_used, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                audio.transcreation_id,
                audio.language,
                audio.voice_id,
                audio.byte_size as i64,
                audio.audio_base64,
                audio.characters_used as i64,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })?;

    log::debug!(
        "Stored audio {} for transcreation {} ({} bytes)",
        id,
        audio.transcreation_id,
        audio.byte_size
    );

    Ok(AudioRow {
        id,
        transcreation_id: audio.transcreation_id,
        language: audio.language.to_string(),
        voice_id: audio.voice_id.to_string(),
        byte_size: audio.byte_size as i64,
        audio_base64: audio.audio_base64.to_string(),
        characters_used: audio.characters_used as i64,
        created_at: now,
    })
}

/// Most recent narration of a transcreation.
pub fn find_latest(db: &Database, transcreation_id: i64) -> Result<Option<AudioRow>, DatabaseError> {
    db.with_conn(|conn| {
        conn.query_row(
            "SELECT * FROM audio_files WHERE transcreation_id = ?1
             ORDER BY created_at DESC, id DESC LIMIT 1",
            params![transcreation_id],
            AudioRow::from_row,
        )
        .optional()
        .map_err(DatabaseError::from)
    })
}
