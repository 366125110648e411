//! Media query operations.
//!
//! Rows are keyed by `id` but deduplicated by `file_path`: inserting a path
//! that already exists refreshes its size and `updated_at` and leaves every
//! other column untouched.

use chrono::{DateTime, Utc};
use mediashelf_common::{Error, MediaCategory, MediaId, MediaKind, Result};
use rusqlite::{params, Connection, Row};

use crate::models::{Media, NewMedia, UpsertedMedia};

/// Filter options for listing media.
#[derive(Debug, Clone, Default)]
pub struct MediaFilter {
    pub kind: Option<MediaKind>,
    pub category: Option<MediaCategory>,
    /// Case-insensitive substring match on the title.
    pub search: Option<String>,
}

/// Pagination options.
#[derive(Debug, Clone, Copy)]
pub struct Pagination {
    pub offset: u32,
    pub limit: u32,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
        }
    }
}

const MEDIA_COLUMNS: &str = "id, file_path, file_name, title, file_size, mime_type, kind, category,
                             year, duration_secs, created_at, updated_at";

fn conversion_error(idx: usize, msg: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, msg.into())
}

pub(crate) fn parse_timestamp(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub(crate) fn parse_media_id(idx: usize, value: &str) -> rusqlite::Result<MediaId> {
    value
        .parse::<MediaId>()
        .map_err(|e| conversion_error(idx, e.to_string()))
}

fn parse_media_row(row: &Row) -> rusqlite::Result<Media> {
    Ok(Media {
        id: parse_media_id(0, &row.get::<_, String>(0)?)?,
        file_path: row.get(1)?,
        file_name: row.get(2)?,
        title: row.get(3)?,
        file_size: row.get::<_, i64>(4)?.max(0) as u64,
        mime_type: row.get(5)?,
        kind: row
            .get::<_, String>(6)?
            .parse()
            .map_err(|e: String| conversion_error(6, e))?,
        category: row
            .get::<_, String>(7)?
            .parse()
            .map_err(|e: String| conversion_error(7, e))?,
        year: row.get(8)?,
        duration_secs: row.get(9)?,
        created_at: parse_timestamp(&row.get::<_, String>(10)?),
        updated_at: parse_timestamp(&row.get::<_, String>(11)?),
    })
}

fn size_to_sql(size: u64) -> Result<i64> {
    i64::try_from(size).map_err(|_| Error::validation(format!("file size {} out of range", size)))
}

/// Insert a media row, or refresh size and `updated_at` when the path exists.
///
/// Relies on the `UNIQUE(file_path)` constraint, so concurrent callers
/// upserting the same path converge on a single row.
pub fn upsert_media(conn: &Connection, new: &NewMedia) -> Result<UpsertedMedia> {
    let id = MediaId::new();
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO media (
            id, file_path, file_name, title, file_size, mime_type, kind, category,
            year, duration_secs, created_at, updated_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL, ?10, ?10)
         ON CONFLICT(file_path) DO UPDATE SET
            file_size = excluded.file_size,
            updated_at = excluded.updated_at",
        params![
            id.to_string(),
            new.file_path,
            new.file_name,
            new.title,
            size_to_sql(new.file_size)?,
            new.mime_type,
            new.kind.as_str(),
            new.category.as_str(),
            new.year,
            now,
        ],
    )
    .map_err(Error::database)?;

    let media = get_media_by_path(conn, &new.file_path)?
        .ok_or_else(|| Error::internal(format!("upserted row vanished: {}", new.file_path)))?;
    let created = media.id == id;

    Ok(UpsertedMedia { media, created })
}

/// Get a media row by ID.
pub fn get_media(conn: &Connection, id: MediaId) -> Result<Option<Media>> {
    match conn.query_row(
        &format!("SELECT {} FROM media WHERE id = ?", MEDIA_COLUMNS),
        [id.to_string()],
        parse_media_row,
    ) {
        Ok(media) => Ok(Some(media)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e)),
    }
}

/// Get a media row by its absolute file path.
pub fn get_media_by_path(conn: &Connection, path: &str) -> Result<Option<Media>> {
    match conn.query_row(
        &format!("SELECT {} FROM media WHERE file_path = ?", MEDIA_COLUMNS),
        [path],
        parse_media_row,
    ) {
        Ok(media) => Ok(Some(media)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e)),
    }
}

/// List every media row, ordered by path.
pub fn list_all_media(conn: &Connection) -> Result<Vec<Media>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {} FROM media ORDER BY file_path",
            MEDIA_COLUMNS
        ))
        .map_err(Error::database)?;

    let rows = stmt
        .query_map([], parse_media_row)
        .map_err(Error::database)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::database)?;

    Ok(rows)
}

fn push_filter_clauses(query: &mut String, filter: &MediaFilter) {
    query.push_str(" WHERE 1=1");
    if filter.kind.is_some() {
        query.push_str(" AND kind = :kind");
    }
    if filter.category.is_some() {
        query.push_str(" AND category = :category");
    }
    if filter.search.is_some() {
        query.push_str(" AND title LIKE :search");
    }
}

fn search_pattern(filter: &MediaFilter) -> Option<String> {
    filter.search.as_ref().map(|s| format!("%{}%", s))
}

/// List media matching a filter, newest first.
pub fn list_media(
    conn: &Connection,
    filter: &MediaFilter,
    pagination: &Pagination,
) -> Result<Vec<Media>> {
    let mut query = format!("SELECT {} FROM media", MEDIA_COLUMNS);
    push_filter_clauses(&mut query, filter);
    query.push_str(" ORDER BY created_at DESC, file_path ASC LIMIT :limit OFFSET :offset");

    let mut stmt = conn.prepare(&query).map_err(Error::database)?;

    let mut params: Vec<(&str, &dyn rusqlite::ToSql)> = vec![
        (":limit", &pagination.limit),
        (":offset", &pagination.offset),
    ];

    let kind = filter.kind.map(|k| k.as_str());
    if let Some(ref kind) = kind {
        params.push((":kind", kind));
    }

    let category = filter.category.map(|c| c.as_str());
    if let Some(ref category) = category {
        params.push((":category", category));
    }

    let pattern = search_pattern(filter);
    if let Some(ref pattern) = pattern {
        params.push((":search", pattern));
    }

    let rows = stmt
        .query_map(&*params, parse_media_row)
        .map_err(Error::database)?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::database)?;

    Ok(rows)
}

/// Count media matching a filter.
pub fn count_media(conn: &Connection, filter: &MediaFilter) -> Result<u64> {
    let mut query = String::from("SELECT COUNT(*) FROM media");
    push_filter_clauses(&mut query, filter);

    let mut params: Vec<(&str, &dyn rusqlite::ToSql)> = Vec::new();

    let kind = filter.kind.map(|k| k.as_str());
    if let Some(ref kind) = kind {
        params.push((":kind", kind));
    }

    let category = filter.category.map(|c| c.as_str());
    if let Some(ref category) = category {
        params.push((":category", category));
    }

    let pattern = search_pattern(filter);
    if let Some(ref pattern) = pattern {
        params.push((":search", pattern));
    }

    let count: i64 = conn
        .query_row(&query, &*params, |row| row.get(0))
        .map_err(Error::database)?;

    Ok(count.max(0) as u64)
}

/// Delete a media row. Its metadata row is removed by the cascade.
///
/// Returns `true` if a row was deleted.
pub fn delete_media(conn: &Connection, id: MediaId) -> Result<bool> {
    let affected = conn
        .execute("DELETE FROM media WHERE id = ?", [id.to_string()])
        .map_err(Error::database)?;
    Ok(affected > 0)
}
