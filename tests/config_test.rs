//! Configuration loading tests.
//!
//! Environment overrides touch process-wide state, so these run serially.

use std::fs;

use mediashelf::config::{load_config, load_config_or_default, Config};
use serial_test::serial;
use tempfile::tempdir;

const ENV_VARS: [&str; 5] = [
    "MEDIA_PATH",
    "TMDB_API_KEY",
    "TMDB_BASE_URL",
    "CACHE_URL",
    "MEDIASHELF_DB_PATH",
];

fn clear_env() {
    for var in ENV_VARS {
        std::env::remove_var(var);
    }
}

fn write_config(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("mediashelf.toml");
    fs::write(&path, contents).unwrap();
    (dir, path)
}

#[test]
#[serial]
fn loads_all_sections() {
    clear_env();
    let (_dir, path) = write_config(
        r#"
        [server]
        host = "127.0.0.1"
        port = 9000
        db_path = "/var/lib/mediashelf/catalog.db"

        [library]
        root_path = "/srv/media"
        follow_links = true
        scan_concurrency = 4

        [tmdb]
        api_key = "secret"
        language = "fr-FR"
        requests_per_second = 10

        [cache]
        url = "memory://"
        "#,
    );

    let config = load_config(&path).unwrap();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 9000);
    assert!(config.library.follow_links);
    assert_eq!(config.library.scan_concurrency, 4);
    assert_eq!(config.tmdb.api_key(), Some("secret"));
    assert_eq!(config.tmdb.language, "fr-FR");
    assert_eq!(config.tmdb.requests_per_second, 10);
    assert_eq!(config.cache.url.as_deref(), Some("memory://"));
}

#[test]
#[serial]
fn environment_overrides_file_values() {
    clear_env();
    let (_dir, path) = write_config(
        r#"
        [library]
        root_path = "/from/file"

        [tmdb]
        api_key = "file-key"
        "#,
    );

    std::env::set_var("MEDIA_PATH", "/from/env");
    std::env::set_var("TMDB_API_KEY", "env-key");
    std::env::set_var("TMDB_BASE_URL", "http://localhost:9999/3");
    std::env::set_var("CACHE_URL", "sqlite:///tmp/mediashelf-cache.db");
    std::env::set_var("MEDIASHELF_DB_PATH", "/tmp/env.db");

    let config = load_config(&path).unwrap();
    clear_env();

    assert_eq!(config.library.root_path.to_str(), Some("/from/env"));
    assert_eq!(config.tmdb.api_key(), Some("env-key"));
    assert_eq!(config.tmdb.base_url, "http://localhost:9999/3");
    assert_eq!(
        config.cache.url.as_deref(),
        Some("sqlite:///tmp/mediashelf-cache.db")
    );
    assert_eq!(config.server.db_path.to_str(), Some("/tmp/env.db"));
}

#[test]
#[serial]
fn blank_environment_values_are_ignored() {
    clear_env();
    let (_dir, path) = write_config("[tmdb]\napi_key = \"file-key\"\n");
    std::env::set_var("TMDB_API_KEY", "  ");

    let config = load_config(&path).unwrap();
    clear_env();
    assert_eq!(config.tmdb.api_key(), Some("file-key"));
}

#[test]
#[serial]
fn scan_concurrency_is_clamped() {
    clear_env();
    let (_dir, path) = write_config("[library]\nscan_concurrency = 64\n");
    assert_eq!(load_config(&path).unwrap().library.scan_concurrency, 8);

    let (_dir, path) = write_config("[library]\nscan_concurrency = 0\n");
    assert_eq!(load_config(&path).unwrap().library.scan_concurrency, 1);
}

#[test]
#[serial]
fn invalid_values_are_rejected() {
    clear_env();
    let (_dir, path) = write_config("[server]\nport = 0\n");
    assert!(load_config(&path).is_err());

    let (_dir, path) = write_config("[tmdb]\nrequests_per_second = 0\n");
    assert!(load_config(&path).is_err());

    let (_dir, path) = write_config("[server\nport = 1");
    assert!(load_config(&path).is_err());
}

#[test]
#[serial]
fn cache_urls_never_fail_loading() {
    clear_env();
    for url in ["redis://localhost", "rediss://cache:6380/1", "ftp://nope", "memory://"] {
        let (_dir, path) = write_config(&format!("[cache]\nurl = \"{url}\"\n"));
        let config = load_config(&path).unwrap();
        assert_eq!(config.cache.url.as_deref(), Some(url));
    }
}

#[test]
#[serial]
fn missing_api_key_is_not_an_error() {
    clear_env();
    let (_dir, path) = write_config("[library]\nroot_path = \"/does/not/exist\"\n");
    let config = load_config(&path).unwrap();
    assert!(config.tmdb.api_key().is_none());
}

#[test]
#[serial]
fn explicit_path_must_exist() {
    clear_env();
    let dir = tempdir().unwrap();
    assert!(load_config_or_default(Some(&dir.path().join("missing.toml"))).is_err());
}

#[test]
fn default_config_round_trips_through_toml() {
    let text = toml::to_string(&Config::default()).unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();
    assert_eq!(parsed.server.port, 8080);
    assert_eq!(parsed.tmdb.base_url, "https://api.themoviedb.org/3");
}
