//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory catalog, a temporary
//! media directory, an optional scripted metadata provider and a full
//! [`AppContext`]. The [`TestHarness::with_server`] constructor starts Axum on
//! a random port for HTTP-level testing.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use mediashelf::cache::Cache;
use mediashelf::catalog::SqliteCatalog;
use mediashelf::config::Config;
use mediashelf::metadata::provider::{
    CastCredit, Credits, CrewCredit, Genre, ImageSize, MetadataProvider, MovieDetails, SearchHit,
    TvDetails,
};
use mediashelf::server::{create_router, AppContext};
use mediashelf_db::pool::init_memory_pool;
use tempfile::TempDir;

/// Provider that answers from fixed title tables and counts every call.
#[derive(Default)]
pub struct FakeProvider {
    pub movies: HashMap<String, u64>,
    pub shows: HashMap<String, u64>,
    pub fail: bool,
    pub searches: AtomicUsize,
    pub detail_calls: AtomicUsize,
}

impl FakeProvider {
    pub fn with_movie(mut self, title: &str, id: u64) -> Self {
        self.movies.insert(title.to_string(), id);
        self
    }

    pub fn with_show(mut self, title: &str, id: u64) -> Self {
        self.shows.insert(title.to_string(), id);
        self
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    fn hit(id: u64) -> Vec<SearchHit> {
        vec![SearchHit {
            id,
            ..Default::default()
        }]
    }
}

#[async_trait]
impl MetadataProvider for FakeProvider {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn search_movie(&self, query: &str, _year: Option<u16>) -> anyhow::Result<Vec<SearchHit>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("provider unavailable");
        }
        Ok(self.movies.get(query).map(|id| Self::hit(*id)).unwrap_or_default())
    }

    async fn search_tv(&self, query: &str, _year: Option<u16>) -> anyhow::Result<Vec<SearchHit>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            anyhow::bail!("provider unavailable");
        }
        Ok(self.shows.get(query).map(|id| Self::hit(*id)).unwrap_or_default())
    }

    async fn movie_details(&self, id: u64) -> anyhow::Result<MovieDetails> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        Ok(MovieDetails {
            id,
            imdb_id: Some(format!("tt{id:07}")),
            overview: Some("A movie.".into()),
            poster_path: Some("/poster.jpg".into()),
            genres: vec![Genre {
                id: 18,
                name: "Drama".into(),
            }],
            runtime: Some(120),
            budget: Some(u64::MAX),
            credits: Credits {
                cast: vec![CastCredit {
                    name: "Lead".into(),
                    character: Some("Hero".into()),
                    profile_path: None,
                }],
                crew: vec![CrewCredit {
                    name: "Someone".into(),
                    job: Some("Director".into()),
                    department: Some("Directing".into()),
                }],
            },
            ..Default::default()
        })
    }

    async fn tv_details(&self, id: u64) -> anyhow::Result<TvDetails> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        Ok(TvDetails {
            id,
            overview: Some("A show.".into()),
            episode_run_time: vec![42],
            ..Default::default()
        })
    }

    fn image_url(&self, path: Option<&str>, size: ImageSize) -> Option<String> {
        path.map(|p| format!("https://img.test/{}{}", size.as_str(), p))
    }
}

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a temporary media directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub catalog: Arc<SqliteCatalog>,
    pub provider: Option<Arc<FakeProvider>>,
    pub media_dir: TempDir,
}

impl TestHarness {
    /// Harness without metadata enrichment.
    pub fn new() -> Self {
        Self::build(None, Cache::disabled(), 1)
    }

    /// Harness whose enrichment pipeline talks to `provider`.
    pub fn with_provider(provider: FakeProvider) -> Self {
        Self::build(Some(Arc::new(provider)), Cache::disabled(), 1)
    }

    pub fn build(provider: Option<Arc<FakeProvider>>, cache: Cache, concurrency: usize) -> Self {
        let media_dir = tempfile::tempdir().expect("failed to create media dir");
        let catalog = Arc::new(SqliteCatalog::new(
            init_memory_pool().expect("failed to create in-memory pool"),
        ));

        let mut config = Config::default();
        config.library.root_path = media_dir.path().to_path_buf();
        config.library.scan_concurrency = concurrency;

        let ctx = AppContext::new(
            config,
            catalog.clone(),
            cache,
            provider
                .clone()
                .map(|p| p as Arc<dyn MetadataProvider>),
        );

        Self {
            ctx,
            catalog,
            provider,
            media_dir,
        }
    }

    pub fn router(&self) -> Router {
        create_router(self.ctx.clone())
    }

    /// Start an Axum server on a random port.
    pub async fn serve(self) -> (Self, SocketAddr) {
        let app = self.router();

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (self, addr)
    }

    pub async fn with_server() -> (Self, SocketAddr) {
        Self::new().serve().await
    }

    pub fn root(&self) -> &Path {
        self.media_dir.path()
    }

    /// Write a file under the media directory, creating parent directories.
    pub fn write_file(&self, relative: &str, contents: &[u8]) -> PathBuf {
        let path = self.media_dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create dirs");
        }
        std::fs::write(&path, contents).expect("failed to write file");
        path
    }

    pub fn provider_searches(&self) -> usize {
        self.provider.as_ref().map_or(0, |p| p.searches())
    }
}
