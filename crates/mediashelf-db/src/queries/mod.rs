//! Database query modules.
//!
//! - media: catalog rows, path-keyed upsert, filtered listing
//! - metadata: provider metadata, one row per media entry
//! - cache_entries: key/value rows backing the SQLite cache store

pub mod cache_entries;
pub mod media;
pub mod metadata;
