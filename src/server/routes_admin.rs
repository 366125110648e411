//! Admin API routes: scanning, orphan reconciliation and cache maintenance.

use std::path::PathBuf;

use axum::{
    body::Bytes,
    extract::{Query, State},
    routing::{delete, post},
    Json, Router,
};
use mediashelf_common::Error;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::error::AppError;
use super::AppContext;
use crate::scanner::ScanResult;

/// Create admin routes.
pub fn admin_routes() -> Router<AppContext> {
    Router::new()
        .route("/scan", post(scan))
        .route("/scan/reconcile", post(reconcile))
        .route("/cache", delete(invalidate_cache))
}

/// Request to scan a directory.
#[derive(Debug, Default, Deserialize)]
pub struct ScanRequest {
    /// Defaults to the configured library root.
    pub path: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ScanResponse {
    pub data: ScanResult,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct InvalidateParams {
    pub pattern: Option<String>,
}

/// POST /api/scan
///
/// Runs the scan to completion before responding.
pub async fn scan(
    State(ctx): State<AppContext>,
    body: Bytes,
) -> Result<Json<ScanResponse>, AppError> {
    let request: ScanRequest = if body.iter().all(u8::is_ascii_whitespace) {
        ScanRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| Error::validation(format!("invalid request body: {e}")))?
    };

    let root = request
        .path
        .filter(|p| !p.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| ctx.config.library.root_path.clone());

    let result = ctx.scanner.scan(&root).await;
    let message = format!(
        "Scan completed: {} added, {} updated, {} errors",
        result.added,
        result.updated,
        result.errors.len()
    );

    Ok(Json(ScanResponse {
        data: result,
        message,
    }))
}

/// POST /api/scan/reconcile
pub async fn reconcile(State(ctx): State<AppContext>) -> Result<Json<Value>, AppError> {
    let deleted = ctx.scanner.reconcile_orphans().await?;
    Ok(Json(json!({ "deleted": deleted })))
}

/// DELETE /api/cache?pattern=<glob>
pub async fn invalidate_cache(
    State(ctx): State<AppContext>,
    Query(params): Query<InvalidateParams>,
) -> Result<Json<Value>, AppError> {
    let pattern = params
        .pattern
        .filter(|p| !p.is_empty())
        .unwrap_or_else(|| "*".to_string());
    let removed = ctx.cache.invalidate(&pattern).await?;
    tracing::info!(pattern = %pattern, removed, "Cache invalidated");
    Ok(Json(json!({ "removed": removed })))
}
