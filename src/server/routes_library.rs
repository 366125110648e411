//! Library browsing and per-item API routes.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use mediashelf_common::{Error, MediaCategory, MediaId, MediaKind};
use mediashelf_db::models::MediaWithMetadata;
use mediashelf_db::queries::media::{MediaFilter, Pagination};
use serde::{Deserialize, Serialize};

use super::error::AppError;
use super::AppContext;
use crate::metadata::{EnrichRequest, EnrichmentOutcome};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 200;

/// Create library routes.
pub fn library_routes() -> Router<AppContext> {
    Router::new()
        .route("/media", get(list_media))
        .route("/media/:id", get(get_media).delete(delete_media))
        .route("/media/:id/enrich", post(enrich_media))
}

// ============================================================================
// Request/Response types
// ============================================================================

/// Query parameters for listing media.
#[derive(Debug, Default, Deserialize)]
pub struct ListMediaParams {
    pub page: Option<u32>,
    #[serde(alias = "pageSize")]
    pub page_size: Option<u32>,
    pub kind: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
}

/// One page of media with metadata.
#[derive(Debug, Serialize)]
pub struct MediaListResponse {
    pub items: Vec<MediaWithMetadata>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

/// Optional overrides for a manual enrichment.
#[derive(Debug, Default, Deserialize)]
pub struct EnrichBody {
    pub title: Option<String>,
    pub year: Option<u16>,
    pub series: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct EnrichResponse {
    /// `enriched`, `no_match` or `provider_failed`.
    pub outcome: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub media: MediaWithMetadata,
}

// ============================================================================
// Helpers
// ============================================================================

fn parse_id(id: &str) -> Result<MediaId, Error> {
    id.parse().map_err(|_| Error::not_found("media", id))
}

fn filter_from(params: &ListMediaParams) -> Result<MediaFilter, Error> {
    let kind = params
        .kind
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<MediaKind>)
        .transpose()
        .map_err(Error::validation)?;
    let category = params
        .category
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<MediaCategory>)
        .transpose()
        .map_err(Error::validation)?;
    let search = params
        .search
        .as_ref()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());

    Ok(MediaFilter {
        kind,
        category,
        search,
    })
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/media
pub async fn list_media(
    State(ctx): State<AppContext>,
    Query(params): Query<ListMediaParams>,
) -> Result<Json<MediaListResponse>, AppError> {
    let filter = filter_from(&params)?;
    let page = params.page.unwrap_or(1).max(1);
    let page_size = params
        .page_size
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let result = ctx.catalog.search(
        &filter,
        &Pagination {
            offset: (page - 1).saturating_mul(page_size),
            limit: page_size,
        },
    )?;

    Ok(Json(MediaListResponse {
        total_pages: result.total.div_ceil(u64::from(page_size)),
        items: result.items,
        total: result.total,
        page,
        page_size,
    }))
}

/// GET /api/media/:id
pub async fn get_media(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<MediaWithMetadata>, AppError> {
    let media_id = parse_id(&id)?;
    let media = ctx
        .catalog
        .find_by_id(media_id)?
        .ok_or_else(|| Error::not_found("media", media_id))?;
    Ok(Json(media))
}

/// DELETE /api/media/:id
pub async fn delete_media(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let media_id = parse_id(&id)?;
    if !ctx.catalog.delete_media(media_id)? {
        return Err(Error::not_found("media", media_id).into());
    }
    tracing::info!(media_id = %media_id, "Deleted media");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/media/:id/enrich
///
/// The body is optional; an empty body enriches with the stored title,
/// year and category.
pub async fn enrich_media(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<EnrichResponse>, AppError> {
    let media_id = parse_id(&id)?;
    let overrides: EnrichBody = if body.iter().all(u8::is_ascii_whitespace) {
        EnrichBody::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| Error::validation(format!("invalid request body: {e}")))?
    };

    let request = EnrichRequest {
        title: overrides.title.filter(|t| !t.trim().is_empty()),
        year: overrides.year,
        series: overrides.series,
    };
    let outcome = ctx.scanner.enrich_entry(media_id, &request).await?;

    let (outcome, reason) = match outcome {
        EnrichmentOutcome::Enriched(_) => ("enriched", None),
        EnrichmentOutcome::NoMatch => ("no_match", None),
        EnrichmentOutcome::ProviderFailed(reason) => ("provider_failed", Some(reason)),
    };

    let media = ctx
        .catalog
        .find_by_id(media_id)?
        .ok_or_else(|| Error::not_found("media", media_id))?;

    Ok(Json(EnrichResponse {
        outcome,
        reason,
        media,
    }))
}
