//! Metadata query operations.
//!
//! Each media row has at most one metadata row. Writes are full replacements:
//! every column is overwritten except `created_at`.

use chrono::Utc;
use mediashelf_common::{Error, MediaId, Result};
use rusqlite::{params, Connection, ErrorCode, Row};

use super::media::{parse_media_id, parse_timestamp};
use crate::models::{Metadata, MetadataFields};

const METADATA_COLUMNS: &str = "media_id, provider_id, external_id, overview, poster_url,
    backdrop_url, rating, vote_count, release_date, genres, cast_members, director, producers,
    runtime_minutes, tagline, original_language, spoken_languages, budget, revenue,
    created_at, updated_at";

fn to_json<T: serde::Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::internal(e.to_string()))
}

fn from_json<T: serde::de::DeserializeOwned + Default>(value: &str) -> T {
    serde_json::from_str(value).unwrap_or_default()
}

fn parse_amount(value: Option<String>) -> Option<u64> {
    value.and_then(|v| v.parse().ok())
}

fn parse_metadata_row(row: &Row) -> rusqlite::Result<Metadata> {
    Ok(Metadata {
        media_id: parse_media_id(0, &row.get::<_, String>(0)?)?,
        fields: MetadataFields {
            provider_id: row.get(1)?,
            external_id: row.get(2)?,
            overview: row.get(3)?,
            poster_url: row.get(4)?,
            backdrop_url: row.get(5)?,
            rating: row.get(6)?,
            vote_count: row.get(7)?,
            release_date: row.get(8)?,
            genres: from_json(&row.get::<_, String>(9)?),
            cast: from_json(&row.get::<_, String>(10)?),
            director: row.get(11)?,
            producers: from_json(&row.get::<_, String>(12)?),
            runtime_minutes: row.get(13)?,
            tagline: row.get(14)?,
            original_language: row.get(15)?,
            spoken_languages: from_json(&row.get::<_, String>(16)?),
            budget: parse_amount(row.get(17)?),
            revenue: parse_amount(row.get(18)?),
        },
        created_at: parse_timestamp(&row.get::<_, String>(19)?),
        updated_at: parse_timestamp(&row.get::<_, String>(20)?),
    })
}

/// Insert or fully replace the metadata row for `media_id`.
///
/// Returns `NotFound` if the media row does not exist.
pub fn upsert_metadata(
    conn: &Connection,
    media_id: MediaId,
    fields: &MetadataFields,
) -> Result<Metadata> {
    let now = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO metadata (
            media_id, provider_id, external_id, overview, poster_url, backdrop_url,
            rating, vote_count, release_date, genres, cast_members, director, producers,
            runtime_minutes, tagline, original_language, spoken_languages, budget, revenue,
            created_at, updated_at
         ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?19,
            ?20, ?20
         )
         ON CONFLICT(media_id) DO UPDATE SET
            provider_id = excluded.provider_id,
            external_id = excluded.external_id,
            overview = excluded.overview,
            poster_url = excluded.poster_url,
            backdrop_url = excluded.backdrop_url,
            rating = excluded.rating,
            vote_count = excluded.vote_count,
            release_date = excluded.release_date,
            genres = excluded.genres,
            cast_members = excluded.cast_members,
            director = excluded.director,
            producers = excluded.producers,
            runtime_minutes = excluded.runtime_minutes,
            tagline = excluded.tagline,
            original_language = excluded.original_language,
            spoken_languages = excluded.spoken_languages,
            budget = excluded.budget,
            revenue = excluded.revenue,
            updated_at = excluded.updated_at",
        params![
            media_id.to_string(),
            fields.provider_id,
            fields.external_id,
            fields.overview,
            fields.poster_url,
            fields.backdrop_url,
            fields.rating,
            fields.vote_count,
            fields.release_date,
            to_json(&fields.genres)?,
            to_json(&fields.cast)?,
            fields.director,
            to_json(&fields.producers)?,
            fields.runtime_minutes,
            fields.tagline,
            fields.original_language,
            to_json(&fields.spoken_languages)?,
            fields.budget.map(|v| v.to_string()),
            fields.revenue.map(|v| v.to_string()),
            now,
        ],
    )
    .map_err(|e| match e {
        rusqlite::Error::SqliteFailure(ref err, _) if err.code == ErrorCode::ConstraintViolation => {
            Error::not_found("media", media_id)
        }
        other => Error::database(other),
    })?;

    get_metadata(conn, media_id)?
        .ok_or_else(|| Error::internal(format!("metadata for {} vanished after upsert", media_id)))
}

/// Get the metadata row for a media entry.
pub fn get_metadata(conn: &Connection, media_id: MediaId) -> Result<Option<Metadata>> {
    match conn.query_row(
        &format!("SELECT {} FROM metadata WHERE media_id = ?", METADATA_COLUMNS),
        [media_id.to_string()],
        parse_metadata_row,
    ) {
        Ok(metadata) => Ok(Some(metadata)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(Error::database(e)),
    }
}

/// Delete the metadata row for a media entry.
pub fn delete_metadata(conn: &Connection, media_id: MediaId) -> Result<bool> {
    let affected = conn
        .execute(
            "DELETE FROM metadata WHERE media_id = ?",
            [media_id.to_string()],
        )
        .map_err(Error::database)?;
    Ok(affected > 0)
}
