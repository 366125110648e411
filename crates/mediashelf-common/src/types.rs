//! Core type definitions for catalog entries.
//!
//! Both enums are persisted and serialized in SCREAMING_SNAKE_CASE so the
//! database column values and the JSON wire format agree.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Broad kind of a media file, derived from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaKind {
    /// Video container (mkv, mp4, ...).
    Video,
    /// Audio track (mp3, flac, ...).
    Audio,
    /// Still image (jpg, png, ...).
    Image,
}

impl MediaKind {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Video => "VIDEO",
            Self::Audio => "AUDIO",
            Self::Image => "IMAGE",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "VIDEO" => Ok(Self::Video),
            "AUDIO" => Ok(Self::Audio),
            "IMAGE" => Ok(Self::Image),
            _ => Err(format!("Unknown media kind: {}", s)),
        }
    }
}

/// Library category of a media file.
///
/// Only `Movie` and `TvShow` entries are eligible for metadata enrichment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MediaCategory {
    Movie,
    TvShow,
    Music,
    Podcast,
    Other,
}

impl MediaCategory {
    /// Database/wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Movie => "MOVIE",
            Self::TvShow => "TV_SHOW",
            Self::Music => "MUSIC",
            Self::Podcast => "PODCAST",
            Self::Other => "OTHER",
        }
    }

    /// Whether entries in this category can be matched against a metadata provider.
    pub fn is_enrichable(&self) -> bool {
        matches!(self, Self::Movie | Self::TvShow)
    }
}

impl fmt::Display for MediaCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MediaCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "MOVIE" => Ok(Self::Movie),
            "TV_SHOW" => Ok(Self::TvShow),
            "MUSIC" => Ok(Self::Music),
            "PODCAST" => Ok(Self::Podcast),
            "OTHER" => Ok(Self::Other),
            _ => Err(format!("Unknown media category: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_round_trips_through_str() {
        for kind in [MediaKind::Video, MediaKind::Audio, MediaKind::Image] {
            assert_eq!(kind.to_string().parse::<MediaKind>().unwrap(), kind);
        }
        assert_eq!("video".parse::<MediaKind>().unwrap(), MediaKind::Video);
        assert!("document".parse::<MediaKind>().is_err());
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&MediaCategory::TvShow).unwrap();
        assert_eq!(json, "\"TV_SHOW\"");
        let parsed: MediaCategory = serde_json::from_str("\"MOVIE\"").unwrap();
        assert_eq!(parsed, MediaCategory::Movie);
        assert_eq!("tv_show".parse::<MediaCategory>().unwrap(), MediaCategory::TvShow);
    }

    #[test]
    fn test_enrichable_categories() {
        assert!(MediaCategory::Movie.is_enrichable());
        assert!(MediaCategory::TvShow.is_enrichable());
        assert!(!MediaCategory::Music.is_enrichable());
        assert!(!MediaCategory::Podcast.is_enrichable());
        assert!(!MediaCategory::Other.is_enrichable());
    }
}
