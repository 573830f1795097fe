//! Router
//!
//! Wires the object routes to their handlers and adds request tracing.

use axum::extract::DefaultBodyLimit;
use axum::routing::{any, get};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use super::handlers::{empty_key, get_object, other_method, put_object, AppState};

/// Fixed prefix in front of every object key
pub const OBJECTS_PREFIX: &str = "/v1/objects/";

/// Build the axum router for the object API
///
/// Only GET and PUT are served; HEAD is not implied by GET. Bodies are
/// streamed, so axum's buffered-extractor limit is lifted; `max_object_size`
/// (when set) is enforced by `RequestBodyLimitLayer`.
pub fn build_router(state: AppState) -> Router {
    let max_object_size = state.store.config().max_object_size;

    let router = Router::new()
        // Unsupported methods validate the key first: a bad key is 400 no
        // matter the method, a good key with the wrong method is 405.
        // HEAD reaches get_object and is turned away there.
        .route(
            "/v1/objects/{*key}",
            get(get_object).put(put_object).fallback(other_method),
        )
        .route(OBJECTS_PREFIX, any(empty_key))
        .with_state(state)
        .layer(DefaultBodyLimit::disable());

    let router = match max_object_size {
        Some(limit) => router.layer(RequestBodyLimitLayer::new(limit)),
        None => router,
    };

    router.layer(TraceLayer::new_for_http())
}
