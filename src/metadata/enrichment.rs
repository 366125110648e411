//! Enrichment service for populating catalog entries with provider metadata.
//!
//! The [`EnrichmentService`] searches the provider, takes the first result,
//! fetches its details and maps them into [`MetadataFields`]. Provider
//! failures are reported as [`EnrichmentOutcome::ProviderFailed`] and never
//! propagate; only catalog writes can fail [`EnrichmentService::enrich_media`].

use std::sync::Arc;

use mediashelf_common::{MediaCategory, Result};
use mediashelf_db::models::{CastMember, Media, MetadataFields};
use tracing::{info, warn};

use super::provider::{
    Credits, Genre, ImageSize, MetadataProvider, MovieDetails, SpokenLanguage, TvDetails,
};
use crate::catalog::Catalog;

const MAX_CAST: usize = 10;

/// Result of one enrichment attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum EnrichmentOutcome {
    Enriched(MetadataFields),
    /// The provider returned no search results.
    NoMatch,
    /// The provider could not be reached or returned an error.
    ProviderFailed(String),
}

/// Overrides for a manual enrichment request.
#[derive(Debug, Clone, Default)]
pub struct EnrichRequest {
    pub title: Option<String>,
    pub year: Option<u16>,
    pub series: Option<bool>,
}

/// Service that enriches catalog entries with metadata from a provider.
///
/// # Example
///
/// ```rust,ignore
/// let service = EnrichmentService::new(provider, catalog);
/// let outcome = service.enrich("Interstellar", Some(2014), false).await;
/// ```
pub struct EnrichmentService {
    provider: Arc<dyn MetadataProvider>,
    catalog: Arc<dyn Catalog>,
}

impl EnrichmentService {
    pub fn new(provider: Arc<dyn MetadataProvider>, catalog: Arc<dyn Catalog>) -> Self {
        Self { provider, catalog }
    }

    /// Look up `title` and map the first match into metadata fields.
    pub async fn enrich(&self, title: &str, year: Option<u16>, is_series: bool) -> EnrichmentOutcome {
        match self.lookup(title, year, is_series).await {
            Ok(Some(fields)) => EnrichmentOutcome::Enriched(fields),
            Ok(None) => {
                info!(title, year = ?year, is_series, "No metadata match");
                EnrichmentOutcome::NoMatch
            }
            Err(e) => {
                let reason = format!("{e:#}");
                warn!(title, year = ?year, is_series, error = %reason, "Metadata lookup failed");
                EnrichmentOutcome::ProviderFailed(reason)
            }
        }
    }

    async fn lookup(
        &self,
        title: &str,
        year: Option<u16>,
        is_series: bool,
    ) -> anyhow::Result<Option<MetadataFields>> {
        let results = if is_series {
            self.provider.search_tv(title, year).await?
        } else {
            self.provider.search_movie(title, year).await?
        };

        let Some(first) = results.first() else {
            return Ok(None);
        };

        let fields = if is_series {
            let details = self.provider.tv_details(first.id).await?;
            self.map_tv(details)
        } else {
            let details = self.provider.movie_details(first.id).await?;
            self.map_movie(details)
        };

        Ok(Some(fields))
    }

    /// Enrich a catalog row using its own title, year and category.
    pub async fn enrich_media(&self, media: &Media) -> Result<EnrichmentOutcome> {
        self.enrich_media_with(media, &EnrichRequest::default())
            .await
    }

    /// Enrich a catalog row, optionally overriding the search inputs.
    ///
    /// On a match the metadata row is inserted or fully replaced.
    pub async fn enrich_media_with(
        &self,
        media: &Media,
        request: &EnrichRequest,
    ) -> Result<EnrichmentOutcome> {
        let title = request.title.as_deref().unwrap_or(&media.title);
        let year = request.year.or(media.year);
        let is_series = request
            .series
            .unwrap_or(media.category == MediaCategory::TvShow);

        let outcome = self.enrich(title, year, is_series).await;
        if let EnrichmentOutcome::Enriched(fields) = &outcome {
            self.catalog.upsert_metadata(media.id, fields)?;
            info!(
                media_id = %media.id,
                title,
                provider_id = ?fields.provider_id,
                "Stored enriched metadata"
            );
        }
        Ok(outcome)
    }

    fn image(&self, path: Option<&str>, size: ImageSize) -> Option<String> {
        self.provider.image_url(path, size)
    }

    fn cast(&self, credits: &Credits) -> Vec<CastMember> {
        credits
            .cast
            .iter()
            .take(MAX_CAST)
            .map(|c| CastMember {
                name: c.name.clone(),
                character: non_empty(c.character.clone()),
                profile_url: self.image(c.profile_path.as_deref(), ImageSize::W500),
            })
            .collect()
    }

    fn map_movie(&self, movie: MovieDetails) -> MetadataFields {
        let crew = &movie.credits.crew;
        let director = crew
            .iter()
            .find(|c| c.job.as_deref() == Some("Director"))
            .map(|c| c.name.clone());
        let producers = crew
            .iter()
            .filter(|c| c.job.as_deref() == Some("Producer"))
            .map(|c| c.name.clone())
            .collect();

        MetadataFields {
            provider_id: Some(movie.id.to_string()),
            external_id: non_empty(movie.imdb_id.clone()),
            overview: non_empty(movie.overview.clone()),
            poster_url: self.image(movie.poster_path.as_deref(), ImageSize::W500),
            backdrop_url: self.image(movie.backdrop_path.as_deref(), ImageSize::Original),
            rating: movie.vote_average,
            vote_count: movie.vote_count,
            release_date: non_empty(movie.release_date.clone()),
            genres: genre_names(&movie.genres),
            cast: self.cast(&movie.credits),
            director: non_empty(director),
            producers,
            runtime_minutes: movie.runtime,
            tagline: non_empty(movie.tagline.clone()),
            original_language: non_empty(movie.original_language.clone()),
            spoken_languages: language_names(&movie.spoken_languages),
            budget: movie.budget,
            revenue: movie.revenue,
        }
    }

    fn map_tv(&self, tv: TvDetails) -> MetadataFields {
        MetadataFields {
            provider_id: Some(tv.id.to_string()),
            external_id: None,
            overview: non_empty(tv.overview.clone()),
            poster_url: self.image(tv.poster_path.as_deref(), ImageSize::W500),
            backdrop_url: self.image(tv.backdrop_path.as_deref(), ImageSize::Original),
            rating: tv.vote_average,
            vote_count: tv.vote_count,
            release_date: non_empty(tv.first_air_date.clone()),
            genres: genre_names(&tv.genres),
            cast: self.cast(&tv.credits),
            director: non_empty(tv.created_by.first().map(|c| c.name.clone())),
            producers: tv.created_by.iter().map(|c| c.name.clone()).collect(),
            runtime_minutes: tv.episode_run_time.first().copied(),
            tagline: non_empty(tv.tagline.clone()),
            original_language: non_empty(tv.original_language.clone()),
            spoken_languages: language_names(&tv.spoken_languages),
            budget: None,
            revenue: None,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn genre_names(genres: &[Genre]) -> Vec<String> {
    genres.iter().map(|g| g.name.clone()).collect()
}

fn language_names(languages: &[SpokenLanguage]) -> Vec<String> {
    languages
        .iter()
        .map(|l| l.name.clone())
        .filter(|n| !n.is_empty())
        .collect()
}
