//! Internal Rust models matching the database schema.
//!
//! Models use types from mediashelf-common where appropriate. Unsigned 64-bit
//! fields serialize as strings at the JSON boundary.

use chrono::{DateTime, Utc};
use mediashelf_common::{json, MediaCategory, MediaId, MediaKind};
use serde::{Deserialize, Serialize};

/// A catalogued media file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Media {
    pub id: MediaId,
    /// Absolute path; unique across the catalog.
    pub file_path: String,
    pub file_name: String,
    pub title: String,
    #[serde(with = "json::u64_string")]
    pub file_size: u64,
    pub mime_type: String,
    pub kind: MediaKind,
    pub category: MediaCategory,
    pub year: Option<u16>,
    pub duration_secs: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for inserting a media row observed by the scanner.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMedia {
    pub file_path: String,
    pub file_name: String,
    pub title: String,
    pub file_size: u64,
    pub mime_type: String,
    pub kind: MediaKind,
    pub category: MediaCategory,
    pub year: Option<u16>,
}

/// Result of a media upsert keyed by file path.
#[derive(Debug, Clone, PartialEq)]
pub struct UpsertedMedia {
    pub media: Media,
    /// `true` when the row did not exist before this call.
    pub created: bool,
}

/// A cast credit attached to metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct CastMember {
    pub name: String,
    pub character: Option<String>,
    pub profile_url: Option<String>,
}

/// Provider-derived descriptive fields.
///
/// A non-null `provider_id` marks the entry as enriched; the scanner skips
/// such paths on later runs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MetadataFields {
    pub provider_id: Option<String>,
    pub external_id: Option<String>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub backdrop_url: Option<String>,
    pub rating: Option<f64>,
    pub vote_count: Option<u32>,
    pub release_date: Option<String>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(default)]
    pub cast: Vec<CastMember>,
    pub director: Option<String>,
    #[serde(default)]
    pub producers: Vec<String>,
    pub runtime_minutes: Option<u32>,
    pub tagline: Option<String>,
    pub original_language: Option<String>,
    #[serde(default)]
    pub spoken_languages: Vec<String>,
    #[serde(with = "json::opt_u64_string", default)]
    pub budget: Option<u64>,
    #[serde(with = "json::opt_u64_string", default)]
    pub revenue: Option<u64>,
}

/// Stored metadata row, one per media entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Metadata {
    pub media_id: MediaId,
    #[serde(flatten)]
    pub fields: MetadataFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A media row joined with its optional metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MediaWithMetadata {
    #[serde(flatten)]
    pub media: Media,
    pub metadata: Option<Metadata>,
}

impl MediaWithMetadata {
    /// Whether a provider match has been stored for this entry.
    pub fn is_enriched(&self) -> bool {
        self.metadata
            .as_ref()
            .is_some_and(|m| m.fields.provider_id.is_some())
    }
}
