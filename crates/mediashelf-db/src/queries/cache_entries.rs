//! Cache entry queries.
//!
//! Backs the SQLite cache store. Values are opaque JSON strings and expiry
//! timestamps are stored as fixed-width RFC 3339 UTC strings so they compare
//! lexicographically.

use chrono::{DateTime, SecondsFormat, Utc};
use mediashelf_common::{Error, Result};
use rusqlite::{params, Connection};

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Get an unexpired value by key.
pub fn get(conn: &Connection, key: &str, now: DateTime<Utc>) -> Result<Option<String>> {
    match conn.query_row(
        "SELECT value FROM cache_entries WHERE key = ?1 AND expires_at > ?2",
        params![key, timestamp(now)],
        |row| row.get::<_, String>(0),
    ) {
        Ok(value) => Ok(Some(value)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e)),
    }
}

/// Store a value, replacing any existing entry for the key.
pub fn set(conn: &Connection, key: &str, value: &str, expires_at: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO cache_entries (key, value, expires_at) VALUES (?1, ?2, ?3)",
        params![key, value, timestamp(expires_at)],
    )
    .map_err(Error::database)?;
    Ok(())
}

/// Delete a single key. Returns `true` if it existed.
pub fn delete(conn: &Connection, key: &str) -> Result<bool> {
    let affected = conn
        .execute("DELETE FROM cache_entries WHERE key = ?1", [key])
        .map_err(Error::database)?;
    Ok(affected > 0)
}

/// Delete every key matching a glob pattern (`*`, `?`, `[...]`).
pub fn delete_matching(conn: &Connection, pattern: &str) -> Result<u64> {
    let affected = conn
        .execute("DELETE FROM cache_entries WHERE key GLOB ?1", [pattern])
        .map_err(Error::database)?;
    Ok(affected as u64)
}

/// Remove entries that expired at or before `now`.
pub fn purge_expired(conn: &Connection, now: DateTime<Utc>) -> Result<u64> {
    let affected = conn
        .execute(
            "DELETE FROM cache_entries WHERE expires_at <= ?1",
            [timestamp(now)],
        )
        .map_err(Error::database)?;
    Ok(affected as u64)
}
