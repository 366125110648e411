//! CLI end-to-end tests
//!
//! Tests for the mediashelf command-line interface.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the mediashelf binary with a clean environment
#[allow(deprecated)]
fn mediashelf_cmd() -> Command {
    let mut cmd = Command::cargo_bin("mediashelf").unwrap();
    for var in [
        "MEDIA_PATH",
        "TMDB_API_KEY",
        "TMDB_BASE_URL",
        "CACHE_URL",
        "MEDIASHELF_DB_PATH",
        "RUST_LOG",
    ] {
        cmd.env_remove(var);
    }
    cmd
}

fn write_config(dir: &Path, media: &Path) -> std::path::PathBuf {
    let config = dir.join("mediashelf.toml");
    fs::write(
        &config,
        format!(
            "[server]\ndb_path = {:?}\n\n[library]\nroot_path = {:?}\n",
            dir.join("catalog.db"),
            media
        ),
    )
    .unwrap();
    config
}

#[test]
fn test_cli_no_args_shows_help() {
    mediashelf_cmd()
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_lists_commands() {
    mediashelf_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("reconcile"))
        .stdout(predicate::str::contains("validate"));
}

#[test]
fn test_cli_version_command() {
    mediashelf_cmd()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mediashelf"));
}

#[test]
fn test_cli_validate_valid_config() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path(), dir.path());

    mediashelf_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration is valid"))
        .stdout(predicate::str::contains("TMDB enrichment: disabled"));
}

#[test]
fn test_cli_validate_rejects_bad_config() {
    let dir = tempdir().unwrap();
    let config = dir.path().join("bad.toml");
    fs::write(&config, "[server]\nport = 0\n").unwrap();

    mediashelf_cmd()
        .arg("validate")
        .arg(&config)
        .assert()
        .failure();
}

#[test]
fn test_cli_scan_then_reconcile() {
    let dir = tempdir().unwrap();
    let media = dir.path().join("media");
    fs::create_dir_all(&media).unwrap();
    fs::write(media.join("Heat.1995.mkv"), b"heat").unwrap();
    fs::write(media.join("song.mp3"), b"song").unwrap();
    let config = write_config(dir.path(), &media);

    let output = mediashelf_cmd()
        .arg("--config")
        .arg(&config)
        .arg("scan")
        .arg("--json")
        .output()
        .unwrap();
    assert!(output.status.success());
    let result: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(result["added"], 2);
    assert_eq!(result["cancelled"], false);

    fs::remove_file(media.join("song.mp3")).unwrap();

    mediashelf_cmd()
        .arg("--config")
        .arg(&config)
        .arg("reconcile")
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed 1 orphaned entries"));
}

#[test]
fn test_cli_scan_explicit_path_summary() {
    let dir = tempdir().unwrap();
    let other = dir.path().join("elsewhere");
    fs::create_dir_all(&other).unwrap();
    fs::write(other.join("clip.webm"), b"clip").unwrap();
    let config = write_config(dir.path(), dir.path());

    mediashelf_cmd()
        .arg("--config")
        .arg(&config)
        .arg("scan")
        .arg(&other)
        .assert()
        .success()
        .stdout(predicate::str::contains("Added:     1"));
}
