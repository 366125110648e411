//! File classification from names alone.
//!
//! Everything here is pure: the same file name always yields the same
//! classification, and nothing touches the filesystem.

use std::path::Path;

use mediashelf_common::paths::{classify_extension, extension_of, mime_type};
use mediashelf_common::{MediaCategory, MediaKind};
use once_cell::sync::Lazy;
use regex::Regex;

static EPISODE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)S\d{2}E\d{2}|\d{1,2}x\d{2}").expect("valid regex"));

static DOTTED_YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\.(19|20)\d{2}\.").expect("valid regex"));

static QUALITY_TOKENS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(1080p|720p|480p|4K|BluRay|WEB-DL|HDTV|x264|x265|HEVC)\b")
        .expect("valid regex")
});

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(19|20)\d{2}\b").expect("valid regex"));

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

/// Everything derived from a file's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: MediaKind,
    pub category: MediaCategory,
    pub title: String,
    pub year: Option<u16>,
    pub mime_type: &'static str,
    pub file_name: String,
}

/// `TvShow` when the name carries an episode marker (`S01E02`, `1x02`),
/// otherwise `Movie`.
pub fn detect_video_category(file_name: &str) -> MediaCategory {
    if EPISODE_MARKER.is_match(file_name) {
        MediaCategory::TvShow
    } else {
        MediaCategory::Movie
    }
}

/// Category for a file of the given kind.
pub fn category_for(kind: MediaKind, file_name: &str) -> MediaCategory {
    match kind {
        MediaKind::Video => detect_video_category(file_name),
        MediaKind::Audio => MediaCategory::Music,
        MediaKind::Image => MediaCategory::Other,
    }
}

fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(idx) if idx + 1 < file_name.len() => &file_name[..idx],
        _ => file_name,
    }
}

/// Derive a human title from a release-style file name.
///
/// ```
/// use mediashelf::scanner::classifier::clean_title;
///
/// assert_eq!(clean_title("The.Matrix.1999.1080p.BluRay.x264.mkv"), "The Matrix");
/// assert_eq!(clean_title("my_home_video.mp4"), "my home video");
/// ```
pub fn clean_title(file_name: &str) -> String {
    let title = strip_extension(file_name);
    let title = DOTTED_YEAR.replace(title, " ");
    let title = title.replace(['.', '_'], " ");
    let title = QUALITY_TOKENS.replace_all(&title, "");
    WHITESPACE.replace_all(&title, " ").trim().to_string()
}

/// First standalone 19xx/20xx in the name.
pub fn extract_year(file_name: &str) -> Option<u16> {
    YEAR.find(file_name).and_then(|m| m.as_str().parse().ok())
}

/// Classify a path by extension and file name, or `None` if unsupported.
pub fn classify_path(path: &Path) -> Option<Classification> {
    let ext = extension_of(path)?;
    let kind = classify_extension(ext)?;
    let file_name = path.file_name()?.to_string_lossy().into_owned();

    Some(Classification {
        kind,
        category: category_for(kind, &file_name),
        title: clean_title(&file_name),
        year: extract_year(&file_name),
        mime_type: mime_type(ext),
        file_name,
    })
}
