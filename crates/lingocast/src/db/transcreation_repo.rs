//! Transcreation repository for the `transcreations` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{now_timestamp, Database, DatabaseError};

#[derive(Debug, Clone)]
pub struct TranscreationRow {
    pub id: i64,
    pub document_id: i64,
    pub target_language: String,
    pub transcreated_text: String,
    pub original_length: i64,
    pub transcreated_length: i64,
    pub tokens_used: i64,
    pub created_at: String,
}

impl TranscreationRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            document_id: row.get("document_id")?,
            target_language: row.get("target_language")?,
            transcreated_text: row.get("transcreated_text")?,
            original_length: row.get("original_length")?,
            transcreated_length: row.get("transcreated_length")?,
            tokens_used: row.get("tokens_used")?,
            created_at: row.get("created_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewTranscreation<'a> {
    pub document_id: i64,
    pub target_language: &'a str,
    pub transcreated_text: &'a str,
    pub original_length: usize,
    pub transcreated_length: usize,
    pub tokens_used: u32,
}

pub fn insert(
    db: &Database,
    t: &NewTranscreation<'_>,
) -> Result<TranscreationRow, DatabaseError> {
    let now = now_timestamp();
    let id = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO transcreations (document_id, target_language, transcreated_text,
             original_length, transcreated_length, tokens_used, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                t.document_id,
                t.target_language,
                t.transcreated_text,
                t.original_length as i64,
                t.transcreated_length as i64,
                t.tokens_used,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })?;

    log::debug!(
        "Stored transcreation {} for document {} ({})",
        id,
        t.document_id,
        t.target_language
    );

    Ok(TranscreationRow {
        id,
        document_id: t.document_id,
        target_language: t.target_language.to_string(),
        transcreated_text: t.transcreated_text.to_string(),
        original_length: t.original_length as i64,
        transcreated_length: t.transcreated_length as i64,
        tokens_used: t.tokens_used as i64,
        created_at: now,
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<TranscreationRow>, DatabaseError> {
    db.with_conn(|conn| {
        conn.query_row(
            "SELECT * FROM transcreations WHERE id = ?1",
            params![id],
            TranscreationRow::from_row,
        )
        .optional()
        .map_err(DatabaseError::from)
    })
}

/// Most recent transcreation of a document into a language. Latest wins when
/// several exist.
pub fn find_latest(
    db: &Database,
    document_id: i64,
    target_language: &str,
) -> Result<Option<TranscreationRow>, DatabaseError> {
    db.with_conn(|conn| {
        conn.query_row(
            "SELECT * FROM transcreations WHERE document_id = ?1 AND target_language = ?2
             ORDER BY created_at DESC, id DESC LIMIT 1",
            params![document_id, target_language],
            TranscreationRow::from_row,
        )
        .optional()
        .map_err(DatabaseError::from)
    })
}

/// All transcreations of a document, newest first.
pub fn list_for_document(
    db: &Database,
    document_id: i64,
) -> Result<Vec<TranscreationRow>, DatabaseError> {
    db.with_conn(|conn| {
        let mut stmt = conn.prepare(
            "SELECT * FROM transcreations WHERE document_id = ?1
             ORDER BY created_at DESC, id DESC",
        )?;
        let rows = stmt
            .query_map(params![document_id], TranscreationRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    })
}
