//! Media streaming module.
//!
//! Catalogued files are served directly, with single-range support so
//! players can seek.
//!
//! # Routes
//!
//! - `GET /api/media/:id/stream` - Direct file streaming with range support

mod direct;

pub use direct::{open_media_stream, stream_media, ByteRange, MediaStream};

use axum::{routing::get, Router};

use crate::server::AppContext;

/// Create direct streaming router.
pub fn stream_router() -> Router<AppContext> {
    Router::new().route("/media/:id/stream", get(stream_media))
}
