//! Streaming endpoint tests.
//!
//! Exercises `GET /api/media/:id/stream` through the router with axum's
//! test utilities.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use common::TestHarness;
use http_body_util::BodyExt;
use mediashelf::catalog::Catalog;
use mediashelf::streaming::open_media_stream;
use mediashelf_common::{Error, MediaId};
use tower::ServiceExt;

const PAYLOAD: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

async fn setup() -> (TestHarness, MediaId) {
    let h = TestHarness::new();
    h.write_file("clip.mp4", PAYLOAD);
    let result = h.ctx.scanner.scan(h.root()).await;
    assert_eq!(result.added, 1);
    let id = h.catalog.list_all().unwrap()[0].id;
    (h, id)
}

async fn get(h: &TestHarness, uri: &str, range: Option<&str>) -> Response {
    let mut req = Request::get(uri);
    if let Some(range) = range {
        req = req.header(header::RANGE, range);
    }
    h.router()
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

fn header_str<'a>(response: &'a Response, name: header::HeaderName) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}

#[tokio::test]
async fn full_file_without_range() {
    let (h, id) = setup().await;
    let response = get(&h, &format!("/api/media/{id}/stream"), None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(header_str(&response, header::CONTENT_TYPE), Some("video/mp4"));
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("36"));
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), Some("bytes"));
    assert!(response.headers().get(header::CONTENT_RANGE).is_none());
    assert_eq!(body_bytes(response).await, PAYLOAD);
}

#[tokio::test]
async fn bounded_range_returns_partial_content() {
    let (h, id) = setup().await;
    let response = get(&h, &format!("/api/media/{id}/stream"), Some("bytes=10-19")).await;

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), Some("bytes 10-19/36"));
    assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("10"));
    assert_eq!(header_str(&response, header::ACCEPT_RANGES), Some("bytes"));
    assert_eq!(body_bytes(response).await, b"abcdefghij");
}

#[tokio::test]
async fn open_and_suffix_ranges() {
    let (h, id) = setup().await;
    let uri = format!("/api/media/{id}/stream");

    let response = get(&h, &uri, Some("bytes=30-")).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), Some("bytes 30-35/36"));
    assert_eq!(body_bytes(response).await, b"uvwxyz");

    let response = get(&h, &uri, Some("bytes=-4")).await;
    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(header_str(&response, header::CONTENT_RANGE), Some("bytes 32-35/36"));
    assert_eq!(body_bytes(response).await, b"wxyz");

    let response = get(&h, &uri, Some("bytes=34-1000")).await;
    assert_eq!(header_str(&response, header::CONTENT_RANGE), Some("bytes 34-35/36"));
    assert_eq!(body_bytes(response).await, b"yz");
}

#[tokio::test]
async fn unusable_ranges_fall_back_to_full_content() {
    let (h, id) = setup().await;
    let uri = format!("/api/media/{id}/stream");

    for range in ["bytes=100-200", "bytes=0-1,4-5", "bytes=x-y", "lines=1-2"] {
        let response = get(&h, &uri, Some(range)).await;
        assert_eq!(response.status(), StatusCode::OK, "range {range}");
        assert_eq!(header_str(&response, header::CONTENT_LENGTH), Some("36"));
        assert_eq!(body_bytes(response).await, PAYLOAD);
    }
}

#[tokio::test]
async fn unknown_and_malformed_ids_are_404() {
    let (h, _) = setup().await;

    let response = get(&h, &format!("/api/media/{}/stream", MediaId::new()), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = get(&h, "/api/media/not-a-uuid/stream", None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn missing_file_is_500_without_the_path() {
    let (h, id) = setup().await;
    std::fs::remove_file(h.root().join("clip.mp4")).unwrap();

    let response = get(&h, &format!("/api/media/{id}/stream"), None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = String::from_utf8(body_bytes(response).await).unwrap();
    assert!(!body.contains("clip.mp4"), "{body}");

    let err = open_media_stream(h.catalog.as_ref(), &id.to_string(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
}

#[tokio::test]
async fn open_media_stream_reports_span() {
    let (h, id) = setup().await;
    let stream = open_media_stream(h.catalog.as_ref(), &id.to_string(), Some("bytes=0-0"))
        .await
        .unwrap();
    assert_eq!(stream.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(stream.content_length(), 1);
    assert_eq!(stream.file_size, 36);
    assert_eq!(stream.content_type, "video/mp4");
}
