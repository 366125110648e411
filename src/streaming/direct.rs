//! Direct streaming with HTTP range requests.
//!
//! Serves catalogued files as-is. A single `bytes=` range yields a 206;
//! anything the parser does not accept falls back to the whole file.

use std::io::SeekFrom;

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use mediashelf_common::{Error, MediaId, Result};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt, Take};
use tokio_util::io::ReaderStream;
use tracing::debug;

use crate::catalog::Catalog;
use crate::server::{error::AppError, AppContext};

/// An inclusive byte span within a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// Parse a `Range` header against a file of `file_size` bytes.
    ///
    /// Supports formats:
    /// - bytes=0-499
    /// - bytes=500- (to end of file)
    /// - bytes=-500 (last 500 bytes)
    ///
    /// Returns `None` for multi-range, malformed or unsatisfiable headers.
    pub fn parse(header: &str, file_size: u64) -> Option<Self> {
        let spec = header.trim().strip_prefix("bytes=")?;
        if spec.contains(',') || file_size == 0 {
            return None;
        }

        let (start, end) = spec.split_once('-')?;
        let (start, end) = (start.trim(), end.trim());
        let last = file_size - 1;

        match (start.is_empty(), end.is_empty()) {
            (true, false) => {
                let suffix: u64 = end.parse().ok()?;
                if suffix == 0 {
                    return None;
                }
                Some(Self {
                    start: file_size.saturating_sub(suffix),
                    end: last,
                })
            }
            (false, true) => {
                let start: u64 = start.parse().ok()?;
                (start <= last).then_some(Self { start, end: last })
            }
            (false, false) => {
                let start: u64 = start.parse().ok()?;
                let end: u64 = end.parse().ok()?;
                if start > end || start > last {
                    return None;
                }
                Some(Self {
                    start,
                    end: end.min(last),
                })
            }
            (true, true) => None,
        }
    }

    /// Number of bytes covered; never zero.
    pub fn length(&self) -> u64 {
        self.end - self.start + 1
    }
}

/// An open file ready to be sent, positioned at the start of its span.
///
/// The file handle lives inside `body` and is closed when the stream is
/// dropped, whether it finished, failed or the client went away.
pub struct MediaStream {
    pub content_type: String,
    pub file_size: u64,
    pub range: Option<ByteRange>,
    pub body: ReaderStream<Take<File>>,
}

impl MediaStream {
    pub fn status(&self) -> StatusCode {
        if self.range.is_some() {
            StatusCode::PARTIAL_CONTENT
        } else {
            StatusCode::OK
        }
    }

    pub fn content_length(&self) -> u64 {
        self.range.map_or(self.file_size, |r| r.length())
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("content_type", &self.content_type)
            .field("file_size", &self.file_size)
            .field("range", &self.range)
            .finish_non_exhaustive()
    }
}

impl IntoResponse for MediaStream {
    fn into_response(self) -> Response {
        let mut builder = Response::builder()
            .status(self.status())
            .header(header::CONTENT_TYPE, &self.content_type)
            .header(header::CONTENT_LENGTH, self.content_length())
            .header(header::ACCEPT_RANGES, "bytes");

        if let Some(range) = self.range {
            builder = builder.header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", range.start, range.end, self.file_size),
            );
        }

        builder
            .body(Body::from_stream(self.body))
            .unwrap_or_else(|e| {
                AppError::from(Error::internal(format!("failed to build response: {e}")))
                    .into_response()
            })
    }
}

/// Open the file behind catalog entry `id` for streaming.
///
/// Unknown and unparseable ids are both `NotFound`. A catalogued file that
/// can no longer be opened is an I/O error.
pub async fn open_media_stream(
    catalog: &dyn Catalog,
    id: &str,
    range_header: Option<&str>,
) -> Result<MediaStream> {
    let media_id: MediaId = id.parse().map_err(|_| Error::not_found("media", id))?;
    let entry = catalog
        .find_by_id(media_id)?
        .ok_or_else(|| Error::not_found("media", media_id))?;
    let media = entry.media;

    let mut file = File::open(&media.file_path).await?;
    let file_size = file.metadata().await?.len();

    let range = range_header.and_then(|h| ByteRange::parse(h, file_size));
    let (start, length) = match range {
        Some(r) => (r.start, r.length()),
        None => (0, file_size),
    };

    if start > 0 {
        file.seek(SeekFrom::Start(start)).await?;
    }

    debug!(
        media_id = %media_id,
        file_size,
        range = ?range,
        "Opening media stream"
    );

    Ok(MediaStream {
        content_type: media.mime_type,
        file_size,
        range,
        body: ReaderStream::new(file.take(length)),
    })
}

/// GET /api/media/:id/stream
pub async fn stream_media(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> std::result::Result<MediaStream, AppError> {
    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    Ok(open_media_stream(ctx.catalog.as_ref(), &id, range).await?)
}
