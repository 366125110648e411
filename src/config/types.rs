use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub tmdb: TmdbConfig,

    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// SQLite catalog file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_db_path() -> PathBuf {
    PathBuf::from("mediashelf.db")
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LibraryConfig {
    /// Directory scanned when a scan request names no path
    #[serde(default = "default_root_path")]
    pub root_path: PathBuf,

    #[serde(default)]
    pub follow_links: bool,

    /// Files processed concurrently per scan (1..=8)
    #[serde(default = "default_scan_concurrency")]
    pub scan_concurrency: usize,
}

fn default_root_path() -> PathBuf {
    PathBuf::from("/media")
}
fn default_scan_concurrency() -> usize {
    1
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root_path: default_root_path(),
            follow_links: false,
            scan_concurrency: default_scan_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    /// Enrichment is disabled when absent
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_tmdb_base_url")]
    pub base_url: String,

    #[serde(default = "default_tmdb_image_base_url")]
    pub image_base_url: String,

    #[serde(default = "default_tmdb_language")]
    pub language: String,

    #[serde(default = "default_requests_per_second")]
    pub requests_per_second: u32,
}

fn default_tmdb_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}
fn default_tmdb_image_base_url() -> String {
    "https://image.tmdb.org/t/p".to_string()
}
fn default_tmdb_language() -> String {
    "en-US".to_string()
}
fn default_requests_per_second() -> u32 {
    4
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_tmdb_base_url(),
            image_base_url: default_tmdb_image_base_url(),
            language: default_tmdb_language(),
            requests_per_second: default_requests_per_second(),
        }
    }
}

impl TmdbConfig {
    /// API key, if one is configured and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CacheConfig {
    /// `memory://`, `sqlite://<path>`, or unset to disable caching
    #[serde(default)]
    pub url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.library.scan_concurrency, 1);
        assert_eq!(config.tmdb.language, "en-US");
        assert_eq!(config.tmdb.requests_per_second, 4);
        assert!(config.cache.url.is_none());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [library]
            root_path = "/srv/media"

            [tmdb]
            api_key = "abc"
            "#,
        )
        .unwrap();
        assert_eq!(config.library.root_path, PathBuf::from("/srv/media"));
        assert!(!config.library.follow_links);
        assert_eq!(config.tmdb.api_key(), Some("abc"));
        assert_eq!(config.tmdb.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.server.host, "0.0.0.0");
    }

    #[test]
    fn test_blank_api_key_is_absent() {
        let tmdb = TmdbConfig {
            api_key: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(tmdb.api_key().is_none());
    }
}
