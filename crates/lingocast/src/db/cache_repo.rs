//! Generic key/value cache with optional expiry, backed by `cache_entries`.

use chrono::{Duration, SecondsFormat, Utc};
use rusqlite::{params, OptionalExtension};

use super::{now_timestamp, Database, DatabaseError};

/// Stores `value` under `key`, replacing any previous entry.
///
/// With a `ttl`, the entry stops being returned once it has elapsed.
pub fn put(
    db: &Database,
    key: &str,
    value: &str,
    ttl: Option<Duration>,
) -> Result<(), DatabaseError> {
    let expires_at = ttl.map(|ttl| (Utc::now() + ttl).to_rfc3339_opts(SecondsFormat::Micros, true));
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO cache_entries (cache_key, value, expires_at, created_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(cache_key) DO UPDATE SET
                value = excluded.value,
                expires_at = excluded.expires_at,
                created_at = excluded.created_at",
            params![key, value, expires_at, now_timestamp()],
        )?;
        Ok(())
    })
}

/// Returns the live value for `key`, if any.
pub fn get(db: &Database, key: &str) -> Result<Option<String>, DatabaseError> {
    db.with_conn(|conn| {
        conn.query_row(
            "SELECT value FROM cache_entries
             WHERE cache_key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
            params![key, now_timestamp()],
            |r| r.get(0),
        )
        .optional()
        .map_err(DatabaseError::from)
    })
}

pub fn remove(db: &Database, key: &str) -> Result<bool, DatabaseError> {
    db.with_conn(|conn| {
        let changed = conn.execute("DELETE FROM cache_entries WHERE cache_key = ?1", params![key])?;
        Ok(changed > 0)
    })
}

/// Deletes expired entries and returns how many were removed.
pub fn purge_expired(db: &Database) -> Result<usize, DatabaseError> {
    let removed = db.with_conn(|conn| {
        let n = conn.execute(
            "DELETE FROM cache_entries WHERE expires_at IS NOT NULL AND expires_at <= ?1",
            params![now_timestamp()],
        )?;
        Ok(n)
    })?;
    if removed > 0 {
        log::info!("Purged {} expired cache entries", removed);
    }
    Ok(removed)
}
