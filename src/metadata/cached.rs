//! Read-through caching wrapper for metadata providers.
//!
//! Search results are kept for a day and details for a week. Cache problems
//! never fail a lookup: a failed read falls through to the live provider and
//! a failed write still returns the fetched result.

use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use std::future::Future;

use super::provider::{ImageSize, MetadataProvider, MovieDetails, SearchHit, TvDetails};
use crate::cache::Cache;

pub const SEARCH_TTL: Duration = Duration::from_secs(24 * 60 * 60);
pub const DETAILS_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// A caching wrapper around another provider.
pub struct CachedProvider<P> {
    inner: P,
    cache: Cache,
}

impl<P: MetadataProvider> CachedProvider<P> {
    pub fn new(inner: P, cache: Cache) -> Self {
        Self { inner, cache }
    }

    pub fn search_key(&self, kind: &str, query: &str, year: Option<u16>) -> String {
        format!(
            "{}:search:{}:{}:{}",
            self.inner.name(),
            kind,
            query,
            year.map(|y| y.to_string()).unwrap_or_default()
        )
    }

    pub fn details_key(&self, kind: &str, id: u64) -> String {
        format!("{}:{}:{}", self.inner.name(), kind, id)
    }

    async fn read_through<T, F, Fut>(
        &self,
        key: String,
        ttl: Duration,
        fetch: F,
    ) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned + Send + Sync,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = anyhow::Result<T>> + Send,
    {
        if let Some(hit) = self.cache.get_json::<T>(&key).await {
            tracing::debug!(key = %key, "Metadata cache hit");
            return Ok(hit);
        }

        let value = fetch().await?;
        self.cache.set_json(&key, &value, ttl).await;
        Ok(value)
    }
}

#[async_trait]
impl<P: MetadataProvider> MetadataProvider for CachedProvider<P> {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn search_movie(
        &self,
        query: &str,
        year: Option<u16>,
    ) -> anyhow::Result<Vec<SearchHit>> {
        let key = self.search_key("movie", query, year);
        self.read_through(key, SEARCH_TTL, || self.inner.search_movie(query, year))
            .await
    }

    async fn search_tv(&self, query: &str, year: Option<u16>) -> anyhow::Result<Vec<SearchHit>> {
        let key = self.search_key("tv", query, year);
        self.read_through(key, SEARCH_TTL, || self.inner.search_tv(query, year))
            .await
    }

    async fn movie_details(&self, id: u64) -> anyhow::Result<MovieDetails> {
        let key = self.details_key("movie", id);
        self.read_through(key, DETAILS_TTL, || self.inner.movie_details(id))
            .await
    }

    async fn tv_details(&self, id: u64) -> anyhow::Result<TvDetails> {
        let key = self.details_key("tv", id);
        self.read_through(key, DETAILS_TTL, || self.inner.tv_details(id))
            .await
    }

    fn image_url(&self, path: Option<&str>, size: ImageSize) -> Option<String> {
        self.inner.image_url(path, size)
    }
}
