//! Extension tables for classifying files and picking a `Content-Type`.
//!
//! Lookups are case-insensitive and accept the extension with or without a
//! leading dot.

use crate::MediaKind;
use std::path::Path;

/// Supported video file extensions.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "wmv", "flv", "webm", "m4v"];

/// Supported audio file extensions.
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "aac", "ogg", "m4a", "wma"];

/// Supported image file extensions.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"];

const DEFAULT_MIME: &str = "application/octet-stream";

fn normalize(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

/// Map an extension to its media kind, or `None` when unsupported.
///
/// # Examples
///
/// ```
/// use mediashelf_common::MediaKind;
/// use mediashelf_common::paths::classify_extension;
///
/// assert_eq!(classify_extension(".MKV"), Some(MediaKind::Video));
/// assert_eq!(classify_extension("flac"), Some(MediaKind::Audio));
/// assert_eq!(classify_extension("txt"), None);
/// ```
pub fn classify_extension(ext: &str) -> Option<MediaKind> {
    let ext = normalize(ext);
    let ext = ext.as_str();
    if VIDEO_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Video)
    } else if AUDIO_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Audio)
    } else if IMAGE_EXTENSIONS.contains(&ext) {
        Some(MediaKind::Image)
    } else {
        None
    }
}

/// Map an extension to a MIME type, falling back to `application/octet-stream`.
pub fn mime_type(ext: &str) -> &'static str {
    match normalize(ext).as_str() {
        "mp4" => "video/mp4",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "mov" => "video/quicktime",
        "wmv" => "video/x-ms-wmv",
        "flv" => "video/x-flv",
        "webm" => "video/webm",
        "m4v" => "video/x-m4v",
        "mp3" => "audio/mpeg",
        "flac" => "audio/flac",
        "wav" => "audio/wav",
        "aac" => "audio/aac",
        "ogg" => "audio/ogg",
        "m4a" => "audio/mp4",
        "wma" => "audio/x-ms-wma",
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        _ => DEFAULT_MIME,
    }
}

/// Extension of `path` as a `&str`, if it has one.
pub fn extension_of(path: &Path) -> Option<&str> {
    path.extension().and_then(|ext| ext.to_str())
}

/// Check if a path has any supported media extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use mediashelf_common::paths::is_media_file;
///
/// assert!(is_media_file(Path::new("/films/Heat.1995.mkv")));
/// assert!(!is_media_file(Path::new("notes.txt")));
/// assert!(!is_media_file(Path::new("README")));
/// ```
pub fn is_media_file(path: &Path) -> bool {
    extension_of(path)
        .and_then(classify_extension)
        .is_some()
}

/// Get the list of supported video extensions.
pub fn video_extensions() -> &'static [&'static str] {
    VIDEO_EXTENSIONS
}

/// Get the list of supported audio extensions.
pub fn audio_extensions() -> &'static [&'static str] {
    AUDIO_EXTENSIONS
}

/// Get the list of supported image extensions.
pub fn image_extensions() -> &'static [&'static str] {
    IMAGE_EXTENSIONS
}
