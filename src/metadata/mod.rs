//! Metadata enrichment from external providers.
//!
//! # Module layout
//!
//! - [`provider`] -- Trait definition and raw result types.
//! - [`providers`] -- Concrete provider implementations (TMDB).
//! - [`cached`] -- Read-through caching wrapper for any provider.
//! - [`enrichment`] -- Maps provider results into catalog metadata.

pub mod cached;
pub mod enrichment;
pub mod provider;
pub mod providers;

pub use cached::CachedProvider;
pub use enrichment::{EnrichRequest, EnrichmentOutcome, EnrichmentService};
pub use provider::{ImageSize, MetadataProvider, MovieDetails, SearchHit, TvDetails};
