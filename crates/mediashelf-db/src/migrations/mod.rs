//! Embedded schema migrations.
//!
//! The schema version lives in SQLite's `user_version` pragma. Step `n` in
//! [`STEPS`] upgrades the schema to version `n + 1` and runs in its own
//! transaction together with the version bump.

use rusqlite::Connection;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration to version {version} failed: {source}")]
    Step {
        version: u32,
        #[source]
        source: rusqlite::Error,
    },
}

const STEPS: &[&str] = &[
    include_str!("001_initial.sql"),
    include_str!("002_cache_entries.sql"),
];

/// Bring the schema up to date. Returns how many steps were applied.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    conn.pragma_update(None, "foreign_keys", true)?;

    let current: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;
    let mut applied = 0;

    for (version, sql) in (1u32..).zip(STEPS).skip(current as usize) {
        let step = |source| MigrationError::Step { version, source };

        let tx = conn.unchecked_transaction().map_err(step)?;
        tx.execute_batch(sql).map_err(step)?;
        tx.pragma_update(None, "user_version", version).map_err(step)?;
        tx.commit().map_err(step)?;

        tracing::debug!(version, "Applied migration");
        applied += 1;
    }

    Ok(applied)
}
