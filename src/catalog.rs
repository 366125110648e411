//! Catalog store: the persistent record of media files and their metadata.
//!
//! The scanner, enrichment pipeline, streaming handler and HTTP routes all
//! talk to the store through [`Catalog`], so tests can substitute their own
//! implementation.

use mediashelf_common::{MediaId, Result};
use mediashelf_db::models::{Media, MediaWithMetadata, Metadata, MetadataFields, NewMedia, UpsertedMedia};
use mediashelf_db::pool::{get_conn, DbPool};
use mediashelf_db::queries::media::{self, MediaFilter, Pagination};
use mediashelf_db::queries::metadata;
use rusqlite::Connection;

/// One page of a filtered listing.
#[derive(Debug, Clone)]
pub struct MediaPage {
    pub items: Vec<MediaWithMetadata>,
    /// Matches across all pages.
    pub total: u64,
}

pub trait Catalog: Send + Sync {
    fn find_by_path(&self, path: &str) -> Result<Option<MediaWithMetadata>>;

    fn find_by_id(&self, id: MediaId) -> Result<Option<MediaWithMetadata>>;

    /// Insert a row, or refresh size and `updated_at` if the path is known.
    fn upsert_media(&self, media: &NewMedia) -> Result<UpsertedMedia>;

    /// Insert or fully replace the metadata for a media row.
    fn upsert_metadata(&self, id: MediaId, fields: &MetadataFields) -> Result<Metadata>;

    /// Delete a row and its metadata. Returns `false` if it did not exist.
    fn delete_media(&self, id: MediaId) -> Result<bool>;

    fn list_all(&self) -> Result<Vec<Media>>;

    /// Filtered listing, newest first.
    fn search(&self, filter: &MediaFilter, page: &Pagination) -> Result<MediaPage>;
}

/// [`Catalog`] backed by the SQLite pool.
#[derive(Clone)]
pub struct SqliteCatalog {
    pool: DbPool,
}

impl SqliteCatalog {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn attach_metadata(conn: &Connection, media: Media) -> Result<MediaWithMetadata> {
    let metadata = metadata::get_metadata(conn, media.id)?;
    Ok(MediaWithMetadata { media, metadata })
}

impl Catalog for SqliteCatalog {
    fn find_by_path(&self, path: &str) -> Result<Option<MediaWithMetadata>> {
        let conn = get_conn(&self.pool)?;
        media::get_media_by_path(&conn, path)?
            .map(|m| attach_metadata(&conn, m))
            .transpose()
    }

    fn find_by_id(&self, id: MediaId) -> Result<Option<MediaWithMetadata>> {
        let conn = get_conn(&self.pool)?;
        media::get_media(&conn, id)?
            .map(|m| attach_metadata(&conn, m))
            .transpose()
    }

    fn upsert_media(&self, new: &NewMedia) -> Result<UpsertedMedia> {
        let conn = get_conn(&self.pool)?;
        media::upsert_media(&conn, new)
    }

    fn upsert_metadata(&self, id: MediaId, fields: &MetadataFields) -> Result<Metadata> {
        let conn = get_conn(&self.pool)?;
        metadata::upsert_metadata(&conn, id, fields)
    }

    fn delete_media(&self, id: MediaId) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        media::delete_media(&conn, id)
    }

    fn list_all(&self) -> Result<Vec<Media>> {
        let conn = get_conn(&self.pool)?;
        media::list_all_media(&conn)
    }

    fn search(&self, filter: &MediaFilter, page: &Pagination) -> Result<MediaPage> {
        let conn = get_conn(&self.pool)?;
        let total = media::count_media(&conn, filter)?;
        let items = media::list_media(&conn, filter, page)?
            .into_iter()
            .map(|m| attach_metadata(&conn, m))
            .collect::<Result<Vec<_>>>()?;
        Ok(MediaPage { items, total })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediashelf_common::{MediaCategory, MediaKind};
    use mediashelf_db::pool::init_memory_pool;

    fn catalog() -> SqliteCatalog {
        SqliteCatalog::new(init_memory_pool().unwrap())
    }

    fn new_media(path: &str) -> NewMedia {
        NewMedia {
            file_path: path.to_string(),
            file_name: "Alien.1979.mkv".to_string(),
            title: "Alien".to_string(),
            file_size: 100,
            mime_type: "video/x-matroska".to_string(),
            kind: MediaKind::Video,
            category: MediaCategory::Movie,
            year: Some(1979),
        }
    }

    #[test]
    fn test_find_includes_metadata() {
        let catalog = catalog();
        let up = catalog.upsert_media(&new_media("/lib/Alien.1979.mkv")).unwrap();

        let found = catalog.find_by_path("/lib/Alien.1979.mkv").unwrap().unwrap();
        assert!(found.metadata.is_none());
        assert!(!found.is_enriched());

        catalog
            .upsert_metadata(
                up.media.id,
                &MetadataFields {
                    provider_id: Some("348".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let found = catalog.find_by_id(up.media.id).unwrap().unwrap();
        assert!(found.is_enriched());
    }

    #[test]
    fn test_search_pages() {
        let catalog = catalog();
        for i in 0..5 {
            catalog
                .upsert_media(&new_media(&format!("/lib/{}.mkv", i)))
                .unwrap();
        }

        let page = catalog
            .search(&MediaFilter::default(), &Pagination { offset: 0, limit: 2 })
            .unwrap();
        assert_eq!(page.total, 5);
        assert_eq!(page.items.len(), 2);
    }

    #[test]
    fn test_delete_and_list() {
        let catalog = catalog();
        let up = catalog.upsert_media(&new_media("/lib/a.mkv")).unwrap();
        catalog.upsert_media(&new_media("/lib/b.mkv")).unwrap();

        assert!(catalog.delete_media(up.media.id).unwrap());
        let all = catalog.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].file_path, "/lib/b.mkv");
        assert!(catalog.find_by_id(up.media.id).unwrap().is_none());
    }
}
