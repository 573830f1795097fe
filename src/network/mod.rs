//! Network Module
//!
//! HTTP surface for the object store.
//!
//! ## Routes
//! - `PUT /v1/objects/{key}` → 201 / 400 / 409 / 500
//! - `GET /v1/objects/{key}` → 200 (streamed) / 400 / 404 / 500
//! - any other method (HEAD included) → 400 for a bad key, else 405
//!
//! ## Architecture
//! - axum on the tokio runtime, one task per request
//! - Filesystem work runs on the blocking pool (`spawn_blocking`)
//! - Store errors render through `IntoResponse` in `response`

mod handlers;
mod response;
mod router;
mod server;

pub use handlers::AppState;
pub use router::{build_router, OBJECTS_PREFIX};
pub use server::Server;
