use async_trait::async_trait;
use mediashelf_common::{Error, Result};
use redis::aio::ConnectionManager;
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tokio::sync::OnceCell;

use super::CacheStore;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
const RECONNECT_BACKOFF: Duration = Duration::from_secs(30);
const SCAN_BATCH: usize = 200;

/// Cache store backed by a Redis server.
///
/// The connection is made on first use, so an unreachable server does not
/// block startup. After a failed connect, calls fail fast for
/// `RECONNECT_BACKOFF` before the next attempt. Redis expires keys itself.
pub struct RedisCache {
    client: redis::Client,
    conn: OnceCell<ConnectionManager>,
    last_failure: Mutex<Option<Instant>>,
}

fn redis_error(e: redis::RedisError) -> Error {
    Error::cache(format!("redis: {e}"))
}

impl RedisCache {
    /// Parse `url` without connecting.
    pub fn open(url: &str) -> Result<Self> {
        let client = redis::Client::open(url).map_err(redis_error)?;
        Ok(Self {
            client,
            conn: OnceCell::new(),
            last_failure: Mutex::new(None),
        })
    }

    async fn connection(&self) -> Result<ConnectionManager> {
        if let Some(conn) = self.conn.get() {
            return Ok(conn.clone());
        }

        let recently_failed = self
            .last_failure
            .lock()
            .map(|last| last.is_some_and(|at| at.elapsed() < RECONNECT_BACKOFF))
            .unwrap_or(false);
        if recently_failed {
            return Err(Error::cache("redis: server unavailable"));
        }

        let result = self
            .conn
            .get_or_try_init(|| async {
                match tokio::time::timeout(
                    CONNECT_TIMEOUT,
                    ConnectionManager::new(self.client.clone()),
                )
                .await
                {
                    Ok(conn) => conn.map_err(redis_error),
                    Err(_) => Err(Error::cache("redis: connect timed out")),
                }
            })
            .await;

        match result {
            Ok(conn) => Ok(conn.clone()),
            Err(e) => {
                if let Ok(mut last) = self.last_failure.lock() {
                    *last = Some(Instant::now());
                }
                Err(e)
            }
        }
    }
}

#[async_trait]
impl CacheStore for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection().await?;
        redis::cmd("GET")
            .arg(key)
            .query_async::<_, Option<String>>(&mut conn)
            .await
            .map_err(redis_error)
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self.connection().await?;
        let secs = ttl.as_secs();
        // EX 0 is rejected by the server; a zero TTL means already expired.
        if secs == 0 {
            return redis::cmd("DEL")
                .arg(key)
                .query_async::<_, ()>(&mut conn)
                .await
                .map_err(redis_error);
        }
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("EX")
            .arg(secs)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(redis_error)
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection().await?;
        let removed = redis::cmd("DEL")
            .arg(key)
            .query_async::<_, u64>(&mut conn)
            .await
            .map_err(redis_error)?;
        Ok(removed > 0)
    }

    async fn invalidate(&self, pattern: &str) -> Result<u64> {
        let mut conn = self.connection().await?;
        let mut cursor: u64 = 0;
        let mut removed = 0;

        loop {
            let (next, keys) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async::<_, (u64, Vec<String>)>(&mut conn)
                .await
                .map_err(redis_error)?;

            if !keys.is_empty() {
                removed += redis::cmd("DEL")
                    .arg(keys.as_slice())
                    .query_async::<_, u64>(&mut conn)
                    .await
                    .map_err(redis_error)?;
            }

            if next == 0 {
                break;
            }
            cursor = next;
        }

        Ok(removed)
    }
}
