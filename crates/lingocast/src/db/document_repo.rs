//! Document repository for the `documents` table.

use rusqlite::{params, OptionalExtension, Row};

use super::{now_timestamp, Database, DatabaseError};

pub const STATUS_EXTRACTED: &str = "extracted";
pub const STATUS_TRANSCREATED: &str = "transcreated";
pub const STATUS_NARRATED: &str = "narrated";

/// A raw document row. `extracted_text` holds the normalized, untruncated text.
#[derive(Debug, Clone)]
pub struct DocumentRow {
    pub id: i64,
    pub original_filename: String,
    pub file_size: i64,
    pub extracted_text: String,
    pub page_count: i64,
    pub extracted_pages: i64,
    pub text_source: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: String,
}

impl DocumentRow {
    fn from_row(row: &Row<'_>) -> Result<Self, rusqlite::Error> {
        Ok(Self {
            id: row.get("id")?,
            original_filename: row.get("original_filename")?,
            file_size: row.get("file_size")?,
            extracted_text: row.get("extracted_text")?,
            page_count: row.get("page_count")?,
            extracted_pages: row.get("extracted_pages")?,
            text_source: row.get("text_source")?,
            status: row.get("status")?,
            created_at: row.get("created_at")?,
            updated_at: row.get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct NewDocument<'a> {
    pub original_filename: &'a str,
    pub file_size: u64,
    pub extracted_text: &'a str,
    pub page_count: u32,
    pub extracted_pages: u32,
    pub text_source: &'a str,
}

/// Inserts a document and returns the stored row.
pub fn insert(db: &Database, doc: &NewDocument<'_>) -> Result<DocumentRow, DatabaseError> {
    let now = now_timestamp();
    let id = db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO documents (original_filename, file_size, extracted_text, page_count,
             extracted_pages, text_source, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
            params![
                doc.original_filename,
                doc.file_size as i64,
                doc.extracted_text,
                doc.page_count,
                doc.extracted_pages,
                doc.text_source,
                STATUS_EXTRACTED,
                now,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })?;

    log::debug!("Stored document {} ({} bytes)", id, doc.file_size);

    Ok(DocumentRow {
        id,
        original_filename: doc.original_filename.to_string(),
        file_size: doc.file_size as i64,
        extracted_text: doc.extracted_text.to_string(),
        page_count: doc.page_count as i64,
        extracted_pages: doc.extracted_pages as i64,
        text_source: doc.text_source.to_string(),
        status: STATUS_EXTRACTED.to_string(),
        created_at: now.clone(),
        updated_at: now,
    })
}

pub fn find_by_id(db: &Database, id: i64) -> Result<Option<DocumentRow>, DatabaseError> {
    db.with_conn(|conn| {
        conn.query_row(
            "SELECT * FROM documents WHERE id = ?1",
            params![id],
            DocumentRow::from_row,
        )
        .optional()
        .map_err(DatabaseError::from)
    })
}

/// Most recent document uploaded under the same filename with the same byte size.
pub fn find_by_name_and_size(
    db: &Database,
    original_filename: &str,
    file_size: u64,
) -> Result<Option<DocumentRow>, DatabaseError> {
    db.with_conn(|conn| {
        conn.query_row(
            "SELECT * FROM documents WHERE original_filename = ?1 AND file_size = ?2
             ORDER BY created_at DESC, id DESC LIMIT 1",
            params![original_filename, file_size as i64],
            DocumentRow::from_row,
        )
        .optional()
        .map_err(DatabaseError::from)
    })
}

/// Updates a document's status. Returns `false` if no row matched.
pub fn update_status(db: &Database, id: i64, status: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute(
            "UPDATE documents SET status = ?2, updated_at = ?3 WHERE id = ?1",
            params![id, status, now_timestamp()],
        )?;
        Ok(changed > 0)
    })
}

/// Deletes a document together with its transcreations and audio.
pub fn delete(db: &Database, id: i64) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute("DELETE FROM documents WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    })
}

pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM documents", [], |r| r.get(0))?;
        Ok(n as u64)
    })
}
