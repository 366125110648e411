use async_trait::async_trait;
use chrono::Utc;
use mediashelf_common::{Error, Result};
use mediashelf_db::pool::{get_conn, init_pool_with, DbPool};
use mediashelf_db::queries::cache_entries;
use std::path::Path;
use std::time::Duration;

use super::CacheStore;

const OPEN_TIMEOUT: Duration = Duration::from_secs(2);

/// Cache store persisted in the `cache_entries` table.
///
/// Survives restarts and can be shared by several processes pointing at the
/// same file.
#[derive(Clone)]
pub struct SqliteCache {
    pool: DbPool,
}

impl SqliteCache {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Open (or create) a cache database at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            if !parent.is_dir() {
                return Err(Error::cache(format!(
                    "cache directory does not exist: {}",
                    parent.display()
                )));
            }
        }
        let path = path
            .to_str()
            .ok_or_else(|| Error::cache("cache path is not valid UTF-8"))?;
        let pool = init_pool_with(path, 2, OPEN_TIMEOUT)?;
        Ok(Self::new(pool))
    }

    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&rusqlite::Connection) -> Result<T> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let conn = get_conn(&pool)?;
            f(&conn)
        })
        .await
        .map_err(|e| Error::cache(format!("cache task failed: {}", e)))?
    }
}

#[async_trait]
impl CacheStore for SqliteCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let key = key.to_string();
        self.run(move |conn| cache_entries::get(conn, &key, Utc::now()))
            .await
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let key = key.to_string();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| Error::cache(format!("ttl out of range: {}", e)))?;
        self.run(move |conn| cache_entries::set(conn, &key, &value, Utc::now() + ttl))
            .await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let key = key.to_string();
        self.run(move |conn| cache_entries::delete(conn, &key)).await
    }

    async fn invalidate(&self, pattern: &str) -> Result<u64> {
        let pattern = pattern.to_string();
        self.run(move |conn| cache_entries::delete_matching(conn, &pattern))
            .await
    }

    async fn purge_expired(&self) -> Result<u64> {
        self.run(|conn| cache_entries::purge_expired(conn, Utc::now()))
            .await
    }
}
