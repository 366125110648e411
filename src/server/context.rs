//! Shared application context.
//!
//! [`AppContext`] is handed to every route handler via Axum state. It wires
//! the catalog, cache, metadata provider chain and scanner together once at
//! startup; the CLI builds the same context for one-shot commands.

use std::sync::Arc;

use anyhow::{Context, Result};
use mediashelf_db::pool::init_pool;
use tracing::{info, warn};

use crate::cache::{Cache, SWEEP_INTERVAL};
use crate::catalog::{Catalog, SqliteCatalog};
use crate::config::Config;
use crate::metadata::providers::TmdbProvider;
use crate::metadata::{CachedProvider, EnrichmentService, MetadataProvider};
use crate::scanner::{Scanner, ScannerOptions};

/// Shared application context.
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<Config>,
    pub catalog: Arc<dyn Catalog>,
    /// Runs scans, reconciles and manual enrichment.
    pub scanner: Arc<Scanner>,
    pub cache: Cache,
}

impl AppContext {
    /// Assemble a context from already-built parts.
    pub fn new(
        config: Config,
        catalog: Arc<dyn Catalog>,
        cache: Cache,
        provider: Option<Arc<dyn MetadataProvider>>,
    ) -> Self {
        let enrichment = provider
            .map(|provider| Arc::new(EnrichmentService::new(provider, catalog.clone())));

        let scanner = Arc::new(Scanner::new(
            catalog.clone(),
            enrichment,
            ScannerOptions {
                follow_links: config.library.follow_links,
                concurrency: config.library.scan_concurrency,
            },
        ));

        Self {
            config: Arc::new(config),
            catalog,
            scanner,
            cache,
        }
    }

    /// Open the database and cache and build the provider chain from config.
    ///
    /// A cache that cannot be opened is logged and left disabled. When called
    /// inside a Tokio runtime, expired cache entries are swept periodically.
    pub fn from_config(config: Config) -> Result<Self> {
        let db_path = config.server.db_path.to_string_lossy().into_owned();
        let pool = init_pool(&db_path)
            .with_context(|| format!("Failed to open database at {db_path}"))?;
        let catalog: Arc<dyn Catalog> = Arc::new(SqliteCatalog::new(pool));

        let cache = Cache::open(config.cache.url.as_deref());
        cache.spawn_sweeper(SWEEP_INTERVAL);

        let provider: Option<Arc<dyn MetadataProvider>> = if config.tmdb.api_key().is_some() {
            let tmdb = TmdbProvider::new(&config.tmdb)?;
            info!(base_url = %config.tmdb.base_url, "TMDB enrichment enabled");
            Some(Arc::new(CachedProvider::new(tmdb, cache.clone())))
        } else {
            warn!("TMDB API key not configured, metadata enrichment disabled");
            None
        };

        Ok(Self::new(config, catalog, cache, provider))
    }
}
