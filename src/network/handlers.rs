//! Request handlers
//!
//! Thin adapters between axum and the synchronous `ObjectStore`.

use std::io;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{header, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use futures::TryStreamExt;
use tokio::task::JoinError;
use tokio_util::io::{ReaderStream, StreamReader, SyncIoBridge};

use crate::error::{Result, StoreError};
use crate::keys::ObjectKey;
use crate::storage::ObjectStore;

/// Shared state for handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ObjectStore>,
}

impl AppState {
    pub fn new(store: Arc<ObjectStore>) -> Self {
        Self { store }
    }
}

fn join_error(e: JoinError) -> StoreError {
    StoreError::Network(format!("blocking task failed: {}", e))
}

/// `PUT /v1/objects/{*key}`
///
/// The body is never buffered whole: it is bridged into a blocking reader and
/// copied into the staging file chunk by chunk. If the client disconnects,
/// the body stream errors, the copy fails and the staging file is dropped.
pub async fn put_object(
    State(state): State<AppState>,
    Path(key): Path<String>,
    body: Body,
) -> Result<Response> {
    let stream = body.into_data_stream().map_err(io::Error::other);
    let reader = SyncIoBridge::new(StreamReader::new(stream));

    let store = Arc::clone(&state.store);
    let receipt = tokio::task::spawn_blocking(move || store.put(&key, reader))
        .await
        .map_err(join_error)??;

    tracing::debug!(key = %receipt.key, size_bytes = receipt.size, "PUT complete");

    Ok((StatusCode::CREATED, "created\n").into_response())
}

/// `GET /v1/objects/{*key}`
///
/// Errors before the first byte become clean status codes. Once streaming has
/// begun the 200 is already committed, so a read failure can only be logged
/// and the client sees a truncated body.
///
/// axum hands HEAD to the GET handler; HEAD is not served here.
pub async fn get_object(
    State(state): State<AppState>,
    method: Method,
    Path(key): Path<String>,
) -> Result<Response> {
    if method == Method::HEAD {
        return other_method(Path(key)).await;
    }

    let store = Arc::clone(&state.store);
    let lookup = key.clone();
    let object = tokio::task::spawn_blocking(move || store.open_object(&lookup))
        .await
        .map_err(join_error)??;

    let size = object.size;
    let path = object.path.display().to_string();
    let file = tokio::fs::File::from_std(object.file);

    let chunk_size = state.store.config().stream_chunk_size;
    let stream = ReaderStream::with_capacity(file, chunk_size).inspect_err(move |e| {
        tracing::error!(key = %key, path = %path, error = %e, "Object stream interrupted");
    });

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, size)
        .body(Body::from_stream(stream))
        .map_err(|e| StoreError::Network(format!("failed to build response: {}", e)))
}

/// Any method other than GET/PUT on an object route
pub async fn other_method(Path(key): Path<String>) -> Result<Response> {
    ObjectKey::parse(&key)?;
    Ok((StatusCode::METHOD_NOT_ALLOWED, "method not allowed\n").into_response())
}

/// `/v1/objects/` with nothing after the prefix
pub async fn empty_key() -> StoreError {
    StoreError::InvalidKey {
        key: String::new(),
        reason: "key is empty",
    }
}
