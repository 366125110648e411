//! Key/value cache for provider responses.
//!
//! [`CacheStore`] is the backend seam; [`Cache`] is the handle the rest of the
//! crate holds. The handle is best-effort: store failures are logged and
//! treated as misses, and a cache that cannot be opened is simply disabled,
//! so a broken cache never fails the caller.

mod memory;
mod redis_store;
mod sqlite;

pub use memory::MemoryCache;
pub use redis_store::RedisCache;
pub use sqlite::SqliteCache;

use async_trait::async_trait;
use mediashelf_common::{Error, Result};
use serde::{de::DeserializeOwned, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// How often expired entries are swept from stores that keep them.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

/// A cache backend holding JSON strings with per-entry TTL.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Get an unexpired value.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store a value; last writer wins.
    async fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()>;

    /// Remove a single key. Returns `true` if it existed.
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Remove every key matching a glob pattern (`*`, `?`, `[...]`).
    async fn invalidate(&self, pattern: &str) -> Result<u64>;

    /// Reclaim expired entries. Stores that expire keys themselves keep the
    /// default.
    async fn purge_expired(&self) -> Result<u64> {
        Ok(0)
    }
}

/// Backend selected by a cache URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    Memory,
    Sqlite(PathBuf),
    Redis(String),
}

impl CacheBackend {
    /// Parse `memory://`, `sqlite://<path>` or `redis://`/`rediss://` URLs.
    pub fn parse(url: &str) -> Result<Self> {
        let url = url.trim();
        if url == "memory://" || url == "memory" {
            return Ok(Self::Memory);
        }
        if let Some(path) = url.strip_prefix("sqlite://") {
            if path.is_empty() {
                return Err(Error::validation("sqlite cache URL needs a path"));
            }
            return Ok(Self::Sqlite(PathBuf::from(path)));
        }
        if url.starts_with("redis://") || url.starts_with("rediss://") {
            return Ok(Self::Redis(url.to_string()));
        }
        Err(Error::validation(format!(
            "unsupported cache URL scheme: {}",
            url
        )))
    }
}

/// Best-effort cache handle. Cloning is cheap.
#[derive(Clone, Default)]
pub struct Cache {
    store: Option<Arc<dyn CacheStore>>,
}

impl std::fmt::Debug for Cache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

impl Cache {
    /// A handle that never stores anything.
    pub fn disabled() -> Self {
        Self { store: None }
    }

    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self { store: Some(store) }
    }

    /// Build a handle from an optional cache URL.
    ///
    /// `None` disables caching. A URL that does not parse or a store that
    /// cannot be opened is logged and also disables caching.
    pub fn open(url: Option<&str>) -> Self {
        let Some(url) = url else {
            return Self::disabled();
        };

        match Self::open_store(url) {
            Ok(store) => {
                tracing::info!(url, "Cache enabled");
                Self::new(store)
            }
            Err(e) => {
                tracing::warn!(url, error = %e, "Cache unavailable, continuing without it");
                Self::disabled()
            }
        }
    }

    fn open_store(url: &str) -> Result<Arc<dyn CacheStore>> {
        Ok(match CacheBackend::parse(url)? {
            CacheBackend::Memory => Arc::new(MemoryCache::new()),
            CacheBackend::Sqlite(path) => Arc::new(SqliteCache::open(&path)?),
            CacheBackend::Redis(url) => Arc::new(RedisCache::open(&url)?),
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Read and deserialize a cached value. Any failure is a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let store = self.store.as_ref()?;
        match store.get(key).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    tracing::warn!(key, error = %e, "Discarding undecodable cache entry");
                    if let Err(e) = store.delete(key).await {
                        tracing::warn!(key, error = %e, "Cache delete failed");
                    }
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache read failed");
                None
            }
        }
    }

    /// Serialize and store a value. Failures are logged and ignored.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        let Some(store) = self.store.as_ref() else {
            return;
        };
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(key, error = %e, "Cache value not serializable");
                return;
            }
        };
        if let Err(e) = store.set(key, raw, ttl).await {
            tracing::warn!(key, error = %e, "Cache write failed");
        }
    }

    /// Remove keys matching `pattern`. A disabled cache removes nothing.
    pub async fn invalidate(&self, pattern: &str) -> Result<u64> {
        match self.store.as_ref() {
            Some(store) => store.invalidate(pattern).await,
            None => Ok(0),
        }
    }

    /// Reclaim expired entries now. Returns how many were removed.
    pub async fn purge_expired(&self) -> u64 {
        let Some(store) = self.store.as_ref() else {
            return 0;
        };
        match store.purge_expired().await {
            Ok(removed) => {
                if removed > 0 {
                    tracing::debug!(removed, "Purged expired cache entries");
                }
                removed
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cache purge failed");
                0
            }
        }
    }

    /// Purge expired entries every `every` on a background task.
    ///
    /// Returns `None` for a disabled cache or outside a Tokio runtime.
    pub fn spawn_sweeper(&self, every: Duration) -> Option<JoinHandle<()>> {
        if !self.is_enabled() {
            return None;
        }
        let handle = tokio::runtime::Handle::try_current().ok()?;
        let cache = self.clone();
        Some(handle.spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            // The first tick completes immediately.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                cache.purge_expired().await;
            }
        }))
    }
}

/// Translate a glob pattern into an anchored regex.
pub(crate) fn glob_to_regex(pattern: &str) -> Result<regex::Regex> {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '*' => out.push_str(".*"),
            '?' => out.push('.'),
            '[' => {
                out.push('[');
                if chars.peek() == Some(&'!') || chars.peek() == Some(&'^') {
                    chars.next();
                    out.push('^');
                }
                for inner in chars.by_ref() {
                    if inner == ']' {
                        break;
                    }
                    if inner == '\\' {
                        out.push_str("\\\\");
                    } else {
                        out.push(inner);
                    }
                }
                out.push(']');
            }
            other => out.push_str(&regex::escape(&other.to_string())),
        }
    }
    out.push('$');
    regex::Regex::new(&out).map_err(|e| Error::validation(format!("invalid pattern: {}", e)))
}
