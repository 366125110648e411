//! TMDB (The Movie Database) metadata provider.
//!
//! Implements [`MetadataProvider`] by querying the TMDB v3 REST API.
//!
//! Features:
//! - Token-bucket rate limiting (default 4 requests / second) via [`governor`].
//! - Automatic retry on HTTP 429 with `Retry-After` header support (max 3 retries).
//! - 30-second request timeout.
//! - Details fetched with `append_to_response=credits` so one call covers cast and crew.

use std::num::NonZeroU32;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use governor::{Quota, RateLimiter};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::TmdbConfig;
use crate::metadata::provider::{ImageSize, MetadataProvider, MovieDetails, SearchHit, TvDetails};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_RETRIES: u32 = 3;
/// Longest `Retry-After` we will honour before retrying.
pub const MAX_RETRY_WAIT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
struct TmdbSearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

// ---------------------------------------------------------------------------
// Provider implementation
// ---------------------------------------------------------------------------

/// TMDB metadata provider.
///
/// # Examples
///
/// ```no_run
/// use mediashelf::config::TmdbConfig;
/// use mediashelf::metadata::providers::TmdbProvider;
///
/// let config = TmdbConfig {
///     api_key: Some("your-api-key".into()),
///     ..Default::default()
/// };
/// let provider = TmdbProvider::new(&config).unwrap();
/// ```
pub struct TmdbProvider {
    client: reqwest::Client,
    api_key: String,
    language: String,
    base_url: String,
    image_base_url: String,
    rate_limiter: governor::RateLimiter<
        governor::state::NotKeyed,
        governor::state::InMemoryState,
        governor::clock::DefaultClock,
    >,
}

impl TmdbProvider {
    /// Build a provider from configuration. Fails when no API key is set.
    pub fn new(config: &TmdbConfig) -> anyhow::Result<Self> {
        let api_key = config
            .api_key()
            .context("TMDB API key is not configured")?
            .to_string();

        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        let per_second = NonZeroU32::new(config.requests_per_second).unwrap_or(NonZeroU32::MIN);
        let rate_limiter = RateLimiter::direct(Quota::per_second(per_second));

        Ok(Self {
            client,
            api_key,
            language: config.language.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            image_base_url: config.image_base_url.trim_end_matches('/').to_string(),
            rate_limiter,
        })
    }

    /// Execute a GET request with rate limiting and 429-retry logic.
    async fn get(&self, url: Url) -> anyhow::Result<reqwest::Response> {
        let path = url.path().to_string();
        let mut retries = 0u32;
        loop {
            self.rate_limiter.until_ready().await;

            let resp = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(reqwest::Error::without_url)
                .with_context(|| format!("TMDB request failed: {path}"))?;

            if resp.status() == StatusCode::TOO_MANY_REQUESTS && retries < MAX_RETRIES {
                retries += 1;
                let wait = retry_after(resp.headers());
                warn!(
                    retry = retries,
                    wait_secs = wait.as_secs(),
                    "TMDB returned 429, backing off"
                );
                tokio::time::sleep(wait).await;
                continue;
            }

            // Strip the URL from errors so the API key never reaches logs.
            let resp = resp
                .error_for_status()
                .map_err(reqwest::Error::without_url)
                .with_context(|| format!("TMDB request returned error: {path}"))?;

            return Ok(resp);
        }
    }

    /// Build a full API URL with the API key and language query parameters.
    fn url(&self, path: &str, extra_params: &[(&str, String)]) -> anyhow::Result<Url> {
        let mut params: Vec<(&str, &str)> = vec![
            ("api_key", self.api_key.as_str()),
            ("language", self.language.as_str()),
        ];
        params.extend(extra_params.iter().map(|(k, v)| (*k, v.as_str())));

        Url::parse_with_params(&format!("{}{}", self.base_url, path), &params)
            .with_context(|| format!("invalid TMDB URL for {path}"))
    }

    async fn search(
        &self,
        path: &str,
        query: &str,
        year_param: &str,
        year: Option<u16>,
    ) -> anyhow::Result<Vec<SearchHit>> {
        let mut params = vec![("query", query.to_string())];
        if let Some(y) = year {
            params.push((year_param, y.to_string()));
        }

        let url = self.url(path, &params)?;
        debug!(path, query, year = ?year, "TMDB search");

        let body: TmdbSearchResponse = self
            .get(url)
            .await?
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("failed to parse TMDB response for {path}"))?;

        Ok(body.results)
    }
}

#[async_trait]
impl MetadataProvider for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    async fn search_movie(
        &self,
        query: &str,
        year: Option<u16>,
    ) -> anyhow::Result<Vec<SearchHit>> {
        self.search("/search/movie", query, "year", year).await
    }

    async fn search_tv(&self, query: &str, year: Option<u16>) -> anyhow::Result<Vec<SearchHit>> {
        self.search("/search/tv", query, "first_air_date_year", year)
            .await
    }

    async fn movie_details(&self, id: u64) -> anyhow::Result<MovieDetails> {
        let path = format!("/movie/{id}");
        let url = self.url(&path, &[("append_to_response", "credits".to_string())])?;
        debug!(path = %path, "TMDB get movie details");

        self.get(url)
            .await?
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("failed to parse TMDB movie detail response")
    }

    async fn tv_details(&self, id: u64) -> anyhow::Result<TvDetails> {
        let path = format!("/tv/{id}");
        let url = self.url(&path, &[("append_to_response", "credits".to_string())])?;
        debug!(path = %path, "TMDB get TV details");

        self.get(url)
            .await?
            .json()
            .await
            .map_err(reqwest::Error::without_url)
            .context("failed to parse TMDB TV detail response")
    }

    fn image_url(&self, path: Option<&str>, size: ImageSize) -> Option<String> {
        let path = path.filter(|p| !p.is_empty())?;
        Some(format!("{}/{}{}", self.image_base_url, size.as_str(), path))
    }
}

/// Wait requested by a 429 response, one second if absent and capped at
/// [`MAX_RETRY_WAIT`].
fn retry_after(headers: &reqwest::header::HeaderMap) -> Duration {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map_or(Duration::from_secs(1), Duration::from_secs)
        .min(MAX_RETRY_WAIT)
}
