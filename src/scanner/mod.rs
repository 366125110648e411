//! Media library scanner.
//!
//! This module walks a directory tree, classifies supported files by name,
//! records them in the catalog and, for movies and TV episodes, runs the
//! enrichment pipeline. It also reconciles catalog rows whose files are gone.

pub mod classifier;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use mediashelf_common::paths::is_media_file;
use mediashelf_common::{Error, MediaId, MediaKind, Result};
use mediashelf_db::models::NewMedia;
use serde::Serialize;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::catalog::Catalog;
use crate::metadata::{EnrichRequest, EnrichmentOutcome, EnrichmentService};

pub use classifier::{classify_path, Classification};

/// Upper bound for files processed concurrently within one scan.
pub const MAX_CONCURRENCY: usize = 8;

/// Scanner tuning.
#[derive(Debug, Clone, Copy)]
pub struct ScannerOptions {
    pub follow_links: bool,
    pub concurrency: usize,
}

impl Default for ScannerOptions {
    fn default() -> Self {
        Self {
            follow_links: false,
            concurrency: 1,
        }
    }
}

/// A path and what went wrong with it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanError {
    pub path: String,
    pub message: String,
}

impl ScanError {
    fn new(path: impl AsRef<Path>, message: impl ToString) -> Self {
        Self {
            path: path.as_ref().display().to_string(),
            message: message.to_string(),
        }
    }
}

/// Totals for one scan run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScanResult {
    pub scanned: usize,
    pub added: usize,
    pub updated: usize,
    pub skipped: usize,
    pub enriched: usize,
    pub unmatched: usize,
    pub errors: Vec<ScanError>,
    pub enrichment_failures: Vec<ScanError>,
    pub cancelled: bool,
}

/// How the catalog row for a file was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileStatus {
    Added,
    Updated,
    Skipped,
}

#[derive(Debug)]
enum Enrichment {
    Enriched,
    Unmatched,
    Failed(String),
}

#[derive(Debug)]
struct FileReport {
    path: PathBuf,
    status: std::result::Result<FileStatus, String>,
    enrichment: Option<Enrichment>,
}

/// Work produced by directory traversal.
enum Discovered {
    File(PathBuf),
    WalkError(ScanError),
}

enum Processed {
    File(FileReport),
    WalkError(ScanError),
}

/// Scanner for discovering and importing media files.
pub struct Scanner {
    catalog: Arc<dyn Catalog>,
    enrichment: Option<Arc<EnrichmentService>>,
    options: ScannerOptions,
    locks: DashMap<PathBuf, Arc<Mutex<()>>>,
}

impl Scanner {
    /// Create a scanner. Concurrency is clamped to `1..=MAX_CONCURRENCY`.
    pub fn new(
        catalog: Arc<dyn Catalog>,
        enrichment: Option<Arc<EnrichmentService>>,
        options: ScannerOptions,
    ) -> Self {
        let options = ScannerOptions {
            concurrency: options.concurrency.clamp(1, MAX_CONCURRENCY),
            ..options
        };
        Self {
            catalog,
            enrichment,
            options,
            locks: DashMap::new(),
        }
    }

    pub fn options(&self) -> ScannerOptions {
        self.options
    }

    /// Scan `root` to completion.
    pub async fn scan(&self, root: &Path) -> ScanResult {
        self.scan_with_cancel(root, &CancellationToken::new()).await
    }

    /// Scan `root`, stopping traversal once `cancel` fires.
    ///
    /// Files already in flight when the token fires still complete.
    pub async fn scan_with_cancel(&self, root: &Path, cancel: &CancellationToken) -> ScanResult {
        info!(
            root = %root.display(),
            concurrency = self.options.concurrency,
            enrichment = self.enrichment.is_some(),
            "Starting scan"
        );

        let mut result = ScanResult::default();

        let root = match tokio::fs::canonicalize(root).await {
            Ok(root) => root,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "Scan root is not accessible");
                result.errors.push(ScanError::new(root, e));
                return result;
            }
        };

        let walker = WalkDir::new(&root)
            .follow_links(self.options.follow_links)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if entry.file_type().is_file() && is_media_file(path) {
                        Some(Discovered::File(entry.into_path()))
                    } else {
                        None
                    }
                }
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
                    warn!(path = %path.display(), error = %e, "Failed to read directory entry");
                    Some(Discovered::WalkError(ScanError::new(path, e)))
                }
            });

        let stopped = AtomicBool::new(false);
        let mut processed = stream::iter(walker)
            .take_while(|_| {
                let go = !cancel.is_cancelled();
                if !go {
                    stopped.store(true, Ordering::Relaxed);
                }
                futures::future::ready(go)
            })
            .map(|item| async move {
                match item {
                    Discovered::File(path) => Processed::File(self.process_file(path).await),
                    Discovered::WalkError(e) => Processed::WalkError(e),
                }
            })
            .buffered(self.options.concurrency);

        while let Some(item) = processed.next().await {
            match item {
                Processed::WalkError(e) => result.errors.push(e),
                Processed::File(report) => record(&mut result, report),
            }
        }
        drop(processed);

        result.cancelled = stopped.load(Ordering::Relaxed);

        info!(
            root = %root.display(),
            scanned = result.scanned,
            added = result.added,
            updated = result.updated,
            skipped = result.skipped,
            enriched = result.enriched,
            unmatched = result.unmatched,
            errors = result.errors.len(),
            enrichment_failures = result.enrichment_failures.len(),
            cancelled = result.cancelled,
            "Scan complete"
        );

        result
    }

    /// Delete catalog rows whose files no longer exist. Returns the count.
    pub async fn reconcile_orphans(&self) -> Result<usize> {
        let all = self.catalog.list_all()?;
        let total = all.len();
        let mut deleted = 0;

        for media in all {
            match tokio::fs::try_exists(&media.file_path).await {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    warn!(path = %media.file_path, error = %e, "Cannot check file, keeping row");
                    continue;
                }
            }

            let lock = self.path_lock(Path::new(&media.file_path));
            let guard = lock.lock().await;
            match self.catalog.delete_media(media.id) {
                Ok(true) => {
                    debug!(media_id = %media.id, path = %media.file_path, "Removed orphaned row");
                    deleted += 1;
                }
                Ok(false) => {}
                Err(e) => {
                    warn!(media_id = %media.id, error = %e, "Failed to remove orphaned row");
                }
            }
            drop(guard);
            self.release_lock(Path::new(&media.file_path), lock);
        }

        info!(checked = total, deleted, "Orphan reconciliation complete");
        Ok(deleted)
    }

    /// Enrich one catalog entry on demand, optionally overriding the search
    /// inputs.
    ///
    /// Holds the entry's path lock so it cannot interleave with a scan or a
    /// reconcile touching the same file.
    pub async fn enrich_entry(
        &self,
        id: MediaId,
        request: &EnrichRequest,
    ) -> Result<EnrichmentOutcome> {
        let Some(service) = &self.enrichment else {
            return Err(Error::validation("metadata enrichment is not configured"));
        };

        let file_path = self
            .catalog
            .find_by_id(id)?
            .ok_or_else(|| Error::not_found("media", id))?
            .media
            .file_path;

        let lock = self.path_lock(Path::new(&file_path));
        let guard = lock.lock().await;
        let outcome = match self.catalog.find_by_id(id) {
            Ok(Some(entry)) => service.enrich_media_with(&entry.media, request).await,
            Ok(None) => Err(Error::not_found("media", id)),
            Err(e) => Err(e),
        };
        drop(guard);
        self.release_lock(Path::new(&file_path), lock);
        outcome
    }

    fn path_lock(&self, path: &Path) -> Arc<Mutex<()>> {
        self.locks
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    fn release_lock(&self, path: &Path, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.locks
            .remove_if(path, |_, lock| Arc::strong_count(lock) == 1);
    }

    async fn process_file(&self, path: PathBuf) -> FileReport {
        let lock = self.path_lock(&path);
        let guard = lock.lock().await;
        let report = self.process_locked(path).await;
        drop(guard);
        self.release_lock(&report.path, lock);
        report
    }

    async fn process_locked(&self, path: PathBuf) -> FileReport {
        let mut report = FileReport {
            status: Err(String::new()),
            enrichment: None,
            path,
        };

        // Catalog paths must round-trip exactly or reconcile would drop the row.
        let Some(path_str) = report.path.to_str().map(str::to_owned) else {
            report.status = Err("path is not valid UTF-8".to_string());
            return report;
        };

        let existing = match self.catalog.find_by_path(&path_str) {
            Ok(existing) => existing,
            Err(e) => {
                report.status = Err(format!("catalog lookup failed: {e}"));
                return report;
            }
        };

        if existing.as_ref().is_some_and(|m| m.is_enriched()) {
            debug!(path = %path_str, "Already enriched, skipping");
            report.status = Ok(FileStatus::Skipped);
            return report;
        }

        let Some(class) = classify_path(&report.path) else {
            report.status = Err("unsupported file type".to_string());
            return report;
        };

        let file_size = match tokio::fs::metadata(&report.path).await {
            Ok(meta) => meta.len(),
            Err(e) => {
                report.status = Err(format!("stat failed: {e}"));
                return report;
            }
        };

        let upserted = match self.catalog.upsert_media(&NewMedia {
            file_path: path_str.clone(),
            file_name: class.file_name,
            title: class.title,
            file_size,
            mime_type: class.mime_type.to_string(),
            kind: class.kind,
            category: class.category,
            year: class.year,
        }) {
            Ok(upserted) => upserted,
            Err(e) => {
                report.status = Err(format!("catalog upsert failed: {e}"));
                return report;
            }
        };

        report.status = Ok(if upserted.created {
            debug!(path = %path_str, media_id = %upserted.media.id, "Added to catalog");
            FileStatus::Added
        } else {
            debug!(path = %path_str, media_id = %upserted.media.id, "Updated catalog entry");
            FileStatus::Updated
        });

        let media = &upserted.media;
        if media.kind != MediaKind::Video || !media.category.is_enrichable() {
            return report;
        }
        let Some(service) = &self.enrichment else {
            return report;
        };

        report.enrichment = Some(match service.enrich_media(media).await {
            Ok(EnrichmentOutcome::Enriched(_)) => Enrichment::Enriched,
            Ok(EnrichmentOutcome::NoMatch) => Enrichment::Unmatched,
            Ok(EnrichmentOutcome::ProviderFailed(reason)) => Enrichment::Failed(reason),
            Err(e) => Enrichment::Failed(format!("metadata upsert failed: {e}")),
        });

        report
    }
}

fn record(result: &mut ScanResult, report: FileReport) {
    result.scanned += 1;

    match report.status {
        Ok(FileStatus::Added) => result.added += 1,
        Ok(FileStatus::Updated) => result.updated += 1,
        Ok(FileStatus::Skipped) => result.skipped += 1,
        Err(message) => {
            warn!(path = %report.path.display(), error = %message, "Failed to scan file");
            result.errors.push(ScanError::new(&report.path, message));
        }
    }

    match report.enrichment {
        Some(Enrichment::Enriched) => result.enriched += 1,
        Some(Enrichment::Unmatched) => result.unmatched += 1,
        Some(Enrichment::Failed(message)) => {
            result
                .enrichment_failures
                .push(ScanError::new(&report.path, message));
        }
        None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SqliteCatalog;
    use crate::metadata::{ImageSize, MetadataProvider, MovieDetails, SearchHit, TvDetails};
    use async_trait::async_trait;
    use mediashelf_db::pool::init_memory_pool;
    use std::fs;
    use std::time::Duration;

    fn scanner(options: ScannerOptions) -> (Scanner, Arc<SqliteCatalog>) {
        let catalog = Arc::new(SqliteCatalog::new(init_memory_pool().unwrap()));
        (Scanner::new(catalog.clone(), None, options), catalog)
    }

    /// Provider that matches every movie query with the same title.
    struct OneHit;

    #[async_trait]
    impl MetadataProvider for OneHit {
        fn name(&self) -> &'static str {
            "one-hit"
        }
        async fn search_movie(&self, _query: &str, _year: Option<u16>) -> anyhow::Result<Vec<SearchHit>> {
            Ok(vec![SearchHit {
                id: 949,
                ..Default::default()
            }])
        }
        async fn search_tv(&self, _query: &str, _year: Option<u16>) -> anyhow::Result<Vec<SearchHit>> {
            Ok(Vec::new())
        }
        async fn movie_details(&self, id: u64) -> anyhow::Result<MovieDetails> {
            Ok(MovieDetails {
                id,
                title: Some("Heat".into()),
                ..Default::default()
            })
        }
        async fn tv_details(&self, id: u64) -> anyhow::Result<TvDetails> {
            Ok(TvDetails {
                id,
                ..Default::default()
            })
        }
        fn image_url(&self, _path: Option<&str>, _size: ImageSize) -> Option<String> {
            None
        }
    }

    fn enriching_scanner() -> (Arc<Scanner>, Arc<SqliteCatalog>) {
        let catalog = Arc::new(SqliteCatalog::new(init_memory_pool().unwrap()));
        let service = EnrichmentService::new(Arc::new(OneHit), catalog.clone());
        let scanner = Scanner::new(
            catalog.clone(),
            Some(Arc::new(service)),
            ScannerOptions::default(),
        );
        (Arc::new(scanner), catalog)
    }

    fn add_movie(catalog: &SqliteCatalog, path: &Path) -> MediaId {
        let class = classify_path(path).unwrap();
        catalog
            .upsert_media(&NewMedia {
                file_path: path.to_str().unwrap().to_string(),
                file_name: class.file_name,
                title: class.title,
                file_size: 1,
                mime_type: class.mime_type.to_string(),
                kind: class.kind,
                category: class.category,
                year: class.year,
            })
            .unwrap()
            .media
            .id
    }

    #[test]
    fn test_concurrency_is_clamped() {
        let (s, _) = scanner(ScannerOptions {
            follow_links: false,
            concurrency: 0,
        });
        assert_eq!(s.options().concurrency, 1);

        let (s, _) = scanner(ScannerOptions {
            follow_links: false,
            concurrency: 64,
        });
        assert_eq!(s.options().concurrency, MAX_CONCURRENCY);
    }

    #[tokio::test]
    async fn test_scan_adds_then_updates() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("Heat.1995.mkv"), b"0123456789").unwrap();
        fs::write(dir.path().join("song.mp3"), b"abc").unwrap();
        fs::write(dir.path().join("notes.txt"), b"ignored").unwrap();

        let (s, catalog) = scanner(ScannerOptions::default());

        let first = s.scan(dir.path()).await;
        assert_eq!(first.scanned, 2);
        assert_eq!(first.added, 2);
        assert!(first.errors.is_empty());
        assert!(!first.cancelled);

        let second = s.scan(dir.path()).await;
        assert_eq!(second.scanned, 2);
        assert_eq!(second.updated, 2);
        assert_eq!(second.added, 0);
        assert_eq!(catalog.list_all().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_root_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let (s, _) = scanner(ScannerOptions::default());
        let result = s.scan(&dir.path().join("nope")).await;
        assert_eq!(result.scanned, 0);
        assert_eq!(result.errors.len(), 1);
        assert!(result.errors[0].path.ends_with("nope"));
    }

    #[tokio::test]
    async fn test_cancelled_scan_stops_early() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.mp4"), b"a").unwrap();

        let (s, catalog) = scanner(ScannerOptions::default());
        let token = CancellationToken::new();
        token.cancel();

        let result = s.scan_with_cancel(dir.path(), &token).await;
        assert!(result.cancelled);
        assert_eq!(result.scanned, 0);
        assert!(catalog.list_all().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_removes_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let keep = dir.path().join("keep.mp4");
        let gone = dir.path().join("gone.mp4");
        fs::write(&keep, b"k").unwrap();
        fs::write(&gone, b"g").unwrap();

        let (s, catalog) = scanner(ScannerOptions::default());
        s.scan(dir.path()).await;
        fs::remove_file(&gone).unwrap();

        assert_eq!(s.reconcile_orphans().await.unwrap(), 1);
        let remaining = catalog.list_all().unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].file_name, "keep.mp4");
        assert_eq!(s.reconcile_orphans().await.unwrap(), 0);
        assert!(s.locks.is_empty());
    }

    #[tokio::test]
    async fn test_manual_enrich_waits_for_path_lock() {
        let (s, catalog) = enriching_scanner();
        let path = Path::new("/library/Heat.1995.mkv");
        let id = add_movie(&catalog, path);

        let lock = s.path_lock(path);
        let guard = lock.lock().await;

        let task = {
            let s = s.clone();
            tokio::spawn(async move { s.enrich_entry(id, &EnrichRequest::default()).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!task.is_finished());
        assert!(!catalog.find_by_id(id).unwrap().unwrap().is_enriched());

        drop(guard);
        s.release_lock(path, lock);

        let outcome = task.await.unwrap().unwrap();
        assert!(matches!(outcome, EnrichmentOutcome::Enriched(_)));
        assert!(catalog.find_by_id(id).unwrap().unwrap().is_enriched());
        assert!(s.locks.is_empty());
    }

    #[tokio::test]
    async fn test_manual_enrich_requires_provider() {
        let (s, catalog) = scanner(ScannerOptions::default());
        let id = add_movie(&catalog, Path::new("/library/Heat.1995.mkv"));

        let err = s.enrich_entry(id, &EnrichRequest::default()).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_manual_enrich_unknown_id() {
        let (s, _) = enriching_scanner();
        let err = s
            .enrich_entry(MediaId::new(), &EnrichRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(s.locks.is_empty());
    }
}
