//! Trait definition and raw result types for metadata providers.
//!
//! The types mirror the TMDB v3 payloads closely so they can be cached
//! verbatim and mapped into catalog metadata by the enrichment pipeline.
//! Every field is defaulted, so partial payloads decode.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// A single search result. Movies carry `title`/`release_date`, TV shows
/// `name`/`first_air_date`; both land in the same fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchHit {
    pub id: u64,
    #[serde(alias = "name")]
    pub title: Option<String>,
    #[serde(alias = "first_air_date")]
    pub release_date: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u32>,
}

// ---------------------------------------------------------------------------
// Details
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Genre {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpokenLanguage {
    pub iso_639_1: Option<String>,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CastCredit {
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrewCredit {
    pub name: String,
    pub job: Option<String>,
    pub department: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credits {
    pub cast: Vec<CastCredit>,
    pub crew: Vec<CrewCredit>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Creator {
    pub name: String,
}

/// Movie details with credits appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovieDetails {
    pub id: u64,
    pub imdb_id: Option<String>,
    pub title: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u32>,
    pub genres: Vec<Genre>,
    pub runtime: Option<u32>,
    pub tagline: Option<String>,
    pub original_language: Option<String>,
    pub spoken_languages: Vec<SpokenLanguage>,
    pub budget: Option<u64>,
    pub revenue: Option<u64>,
    pub credits: Credits,
}

/// TV show details with credits appended.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TvDetails {
    pub id: u64,
    pub name: Option<String>,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub first_air_date: Option<String>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u32>,
    pub genres: Vec<Genre>,
    pub episode_run_time: Vec<u32>,
    pub tagline: Option<String>,
    pub original_language: Option<String>,
    pub spoken_languages: Vec<SpokenLanguage>,
    pub created_by: Vec<Creator>,
    pub credits: Credits,
}

// ---------------------------------------------------------------------------
// Images
// ---------------------------------------------------------------------------

/// Image rendition requested from the provider's image CDN.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    W500,
    W780,
    Original,
}

impl ImageSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::W500 => "w500",
            Self::W780 => "w780",
            Self::Original => "original",
        }
    }
}

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// Async trait that metadata backends implement.
///
/// Search results are returned in the provider's own relevance order.
#[async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Short, lowercase identifier for this provider (e.g. `"tmdb"`).
    /// Used as the cache key prefix.
    fn name(&self) -> &'static str;

    async fn search_movie(&self, query: &str, year: Option<u16>)
        -> anyhow::Result<Vec<SearchHit>>;

    async fn search_tv(&self, query: &str, year: Option<u16>) -> anyhow::Result<Vec<SearchHit>>;

    async fn movie_details(&self, id: u64) -> anyhow::Result<MovieDetails>;

    async fn tv_details(&self, id: u64) -> anyhow::Result<TvDetails>;

    /// Absolute image URL for a provider path, or `None` when there is no path.
    fn image_url(&self, path: Option<&str>, size: ImageSize) -> Option<String>;
}

#[async_trait]
impl<P: MetadataProvider + ?Sized> MetadataProvider for Arc<P> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    async fn search_movie(
        &self,
        query: &str,
        year: Option<u16>,
    ) -> anyhow::Result<Vec<SearchHit>> {
        (**self).search_movie(query, year).await
    }

    async fn search_tv(&self, query: &str, year: Option<u16>) -> anyhow::Result<Vec<SearchHit>> {
        (**self).search_tv(query, year).await
    }

    async fn movie_details(&self, id: u64) -> anyhow::Result<MovieDetails> {
        (**self).movie_details(id).await
    }

    async fn tv_details(&self, id: u64) -> anyhow::Result<TvDetails> {
        (**self).tv_details(id).await
    }

    fn image_url(&self, path: Option<&str>, size: ImageSize) -> Option<String> {
        (**self).image_url(path, size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_hit_accepts_movie_and_tv_shapes() {
        let movie: SearchHit = serde_json::from_str(
            r#"{"id": 949, "title": "Heat", "release_date": "1995-12-15", "vote_average": 7.9}"#,
        )
        .unwrap();
        assert_eq!(movie.title.as_deref(), Some("Heat"));
        assert_eq!(movie.release_date.as_deref(), Some("1995-12-15"));

        let tv: SearchHit =
            serde_json::from_str(r#"{"id": 4607, "name": "Lost", "first_air_date": "2004-09-22"}"#)
                .unwrap();
        assert_eq!(tv.title.as_deref(), Some("Lost"));
        assert_eq!(tv.release_date.as_deref(), Some("2004-09-22"));
    }

    #[test]
    fn details_tolerate_missing_fields() {
        let details: MovieDetails = serde_json::from_str(r#"{"id": 1}"#).unwrap();
        assert!(details.credits.cast.is_empty());
        assert!(details.genres.is_empty());

        let tv: TvDetails = serde_json::from_str(r#"{"id": 2, "episode_run_time": []}"#).unwrap();
        assert!(tv.created_by.is_empty());
    }

    #[test]
    fn image_size_labels() {
        assert_eq!(ImageSize::W500.as_str(), "w500");
        assert_eq!(ImageSize::W780.as_str(), "w780");
        assert_eq!(ImageSize::Original.as_str(), "original");
    }
}
