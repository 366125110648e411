mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::cache::CacheBackend;

const MAX_SCAN_CONCURRENCY: usize = 8;

/// Load configuration from a TOML file, then apply environment overrides.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    apply_env_overrides(&mut config);
    validate_config(&mut config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./mediashelf.toml",
        "~/.config/mediashelf/config.toml",
        "/etc/mediashelf/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    let mut config = Config::default();
    apply_env_overrides(&mut config);
    validate_config(&mut config)?;
    Ok(config)
}

fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Environment variables take precedence over file values.
pub fn apply_env_overrides(config: &mut Config) {
    if let Some(path) = env_value("MEDIA_PATH") {
        config.library.root_path = PathBuf::from(path);
    }
    if let Some(key) = env_value("TMDB_API_KEY") {
        config.tmdb.api_key = Some(key);
    }
    if let Some(url) = env_value("TMDB_BASE_URL") {
        config.tmdb.base_url = url;
    }
    if let Some(url) = env_value("CACHE_URL") {
        config.cache.url = Some(url);
    }
    if let Some(path) = env_value("MEDIASHELF_DB_PATH") {
        config.server.db_path = PathBuf::from(path);
    }
}

/// Validate configuration, clamping soft limits.
pub fn validate_config(config: &mut Config) -> Result<()> {
    if config.server.port == 0 {
        anyhow::bail!("Server port cannot be 0");
    }

    if let Some(url) = &config.cache.url {
        if let Err(e) = CacheBackend::parse(url) {
            tracing::warn!(url = %url, error = %e, "Unusable cache URL, caching disabled");
        }
    }

    let requested = config.library.scan_concurrency;
    let clamped = requested.clamp(1, MAX_SCAN_CONCURRENCY);
    if clamped != requested {
        tracing::warn!(requested, clamped, "scan_concurrency out of range, clamping");
        config.library.scan_concurrency = clamped;
    }

    if config.tmdb.requests_per_second == 0 {
        anyhow::bail!("tmdb.requests_per_second cannot be 0");
    }

    if !config.library.root_path.exists() {
        tracing::warn!("Library root does not exist: {:?}", config.library.root_path);
    }

    if config.tmdb.api_key().is_none() {
        tracing::warn!("No TMDB API key configured, metadata enrichment disabled");
    }

    Ok(())
}
