//! Tests for the HTTP router
//!
//! These tests verify:
//! - Status codes for PUT/GET (201, 200, 400, 404, 409, 405)
//! - Key extraction at the routing boundary
//! - Streaming GET headers and body
//! - Body size limit
//! - Client disconnect mid-PUT leaves no blob or staging file

use std::io;
use std::sync::Arc;

use axum::body::{to_bytes, Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use futures::stream;
use immustore::config::Config;
use immustore::network::{build_router, AppState};
use immustore::storage::ObjectStore;
use tempfile::TempDir;
use tower::ServiceExt;

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_app_with(config: Config) -> (TempDir, Router, Arc<ObjectStore>) {
    let temp_dir = TempDir::new().unwrap();
    let config = Config {
        storage_root: temp_dir.path().join("blobs"),
        ..config
    };
    let store = Arc::new(ObjectStore::open(config).unwrap());
    let app = build_router(AppState::new(Arc::clone(&store)));
    (temp_dir, app, store)
}

fn setup_app() -> (TempDir, Router, Arc<ObjectStore>) {
    setup_app_with(Config::default())
}

async fn send(app: &Router, method: Method, uri: &str, body: Body) -> (StatusCode, Vec<u8>) {
    let response = app
        .clone()
        .oneshot(Request::builder().method(method).uri(uri).body(body).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, bytes.to_vec())
}

async fn put(app: &Router, uri: &str, data: &'static [u8]) -> StatusCode {
    send(app, Method::PUT, uri, Body::from(data)).await.0
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    send(app, Method::GET, uri, Body::empty()).await
}

// =============================================================================
// Walkthrough
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_put_get_conflict_traversal() {
    let (_temp, app, _store) = setup_app();

    assert_eq!(put(&app, "/v1/objects/foo/bar", b"hello").await, StatusCode::CREATED);

    let (status, body) = get(&app, "/v1/objects/foo/bar").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"hello");

    assert_eq!(put(&app, "/v1/objects/foo/bar", b"world").await, StatusCode::CONFLICT);

    let (status, _) = get(&app, "/v1/objects/../etc/passwd").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) = get(&app, "/v1/objects/foo/bar").await;
    assert_eq!(body, b"hello");
}

// =============================================================================
// PUT Tests
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_put_created_body() {
    let (_temp, app, _store) = setup_app();

    let (status, body) = send(&app, Method::PUT, "/v1/objects/a", Body::from("x")).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, b"created\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_put_empty_body() {
    let (_temp, app, _store) = setup_app();

    assert_eq!(put(&app, "/v1/objects/empty", b"").await, StatusCode::CREATED);

    let (status, body) = get(&app, "/v1/objects/empty").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn test_put_large_streamed_body() {
    let (_temp, app, store) = setup_app();
    let data: Vec<u8> = (0..3 * 1024 * 1024).map(|i| (i % 251) as u8).collect();

    let (status, _) = send(&app, Method::PUT, "/v1/objects/big", Body::from(data.clone())).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = get(&app, "/v1/objects/big").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body == data);
    assert_eq!(store.open_object("big").unwrap().size, data.len() as u64);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_put_invalid_key_creates_nothing() {
    let (_temp, app, store) = setup_app();

    assert_eq!(put(&app, "/v1/objects/../escape", b"x").await, StatusCode::BAD_REQUEST);
    assert_eq!(put(&app, "/v1/objects/a/../../b", b"x").await, StatusCode::BAD_REQUEST);

    assert_eq!(std::fs::read_dir(store.root()).unwrap().count(), 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_put_client_disconnect_leaves_nothing() {
    let (_temp, app, store) = setup_app();

    // 4 KiB arrives, then the connection drops
    let chunks: Vec<Result<Bytes, io::Error>> = vec![
        Ok(Bytes::from(vec![b'z'; 4096])),
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset")),
    ];
    let body = Body::from_stream(stream::iter(chunks));

    let (status, _) = send(&app, Method::PUT, "/v1/objects/cut/short", body).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!store.exists("cut/short").unwrap());
    let leftovers: Vec<_> = std::fs::read_dir(store.root().join("cut"))
        .unwrap()
        .collect();
    assert!(leftovers.is_empty(), "staging file left behind: {:?}", leftovers);

    // The key is still free for a retry
    assert_eq!(put(&app, "/v1/objects/cut/short", b"whole").await, StatusCode::CREATED);
}

// =============================================================================
// GET Tests
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_get_missing_is_404() {
    let (_temp, app, _store) = setup_app();

    let (status, body) = get(&app, "/v1/objects/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, b"object not found\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_headers() {
    let (_temp, app, _store) = setup_app();
    put(&app, "/v1/objects/doc", b"0123456789").await;

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/v1/objects/doc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(header::CONTENT_LENGTH).unwrap(), "10");
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/octet-stream"
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_get_streams_in_small_chunks() {
    let (_temp, app, _store) = setup_app_with(Config::builder().stream_chunk_size(7).build());
    let data: &'static [u8] = b"the quick brown fox jumps over the lazy dog";
    put(&app, "/v1/objects/fox", data).await;

    let (status, body) = get(&app, "/v1/objects/fox").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, data);
}

// =============================================================================
// Key Extraction Tests
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_empty_key_is_400() {
    let (_temp, app, _store) = setup_app();

    let (status, _) = get(&app, "/v1/objects/").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(put(&app, "/v1/objects/", b"x").await, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/v1/objects//").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_extra_leading_separator_is_stripped() {
    let (_temp, app, _store) = setup_app();

    assert_eq!(put(&app, "/v1/objects//lead", b"ok").await, StatusCode::CREATED);

    let (status, body) = get(&app, "/v1/objects/lead").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"ok");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_percent_encoded_traversal_is_400() {
    let (_temp, app, _store) = setup_app();

    let (status, _) = get(&app, "/v1/objects/%2e%2e/secret").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/v1/objects/a/%2E%2E/%2E%2E/secret").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(flavor = "multi_thread")]
async fn test_other_methods_are_405() {
    let (_temp, app, _store) = setup_app();
    put(&app, "/v1/objects/thing", b"x").await;

    for method in [Method::HEAD, Method::DELETE, Method::POST, Method::PATCH] {
        let (status, _) = send(&app, method.clone(), "/v1/objects/thing", Body::empty()).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED, "{}", method);
    }

    let (_, body) = get(&app, "/v1/objects/thing").await;
    assert_eq!(body, b"x");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_other_methods_validate_key_first() {
    let (_temp, app, _store) = setup_app();

    for method in [Method::DELETE, Method::HEAD, Method::POST] {
        let (status, _) = send(&app, method.clone(), "/v1/objects/../x", Body::empty()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", method);
    }

    // Valid but never-written key still gets 405, not 404
    let (status, body) = send(&app, Method::DELETE, "/v1/objects/absent", Body::empty()).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body, b"method not allowed\n");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unknown_route_is_404() {
    let (_temp, app, _store) = setup_app();

    let (status, _) = get(&app, "/v2/objects/x").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Limits
// =============================================================================

#[tokio::test(flavor = "multi_thread")]
async fn test_body_over_limit_rejected() {
    let (_temp, app, store) =
        setup_app_with(Config::builder().max_object_size(Some(16)).build());

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method(Method::PUT)
                .uri("/v1/objects/too-big")
                .header(header::CONTENT_LENGTH, 64)
                .body(Body::from(vec![0u8; 64]))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(!store.exists("too-big").unwrap());

    assert_eq!(put(&app, "/v1/objects/small", b"fits").await, StatusCode::CREATED);
}
