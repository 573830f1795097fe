//! # immustore
//!
//! A minimal, single-node, write-once object store over HTTP:
//! - Keys mapped to paths under one storage root, traversal rejected up front
//! - Durable, atomic PUT (stage → fsync → rename), never a partial blob
//! - Streaming GET with bounded memory
//! - No overwrite, no delete, no listing
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     HTTP Server (axum)                      │
//! │              PUT / GET  /v1/objects/{key}                   │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ raw key
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                      Key Mapper                             │
//! │        normalize, reject "..", stay under the root          │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │ path
//! ┌─────────────────────▼───────────────────────────────────────┐
//! │                     Object Store                            │
//! │     PUT: check → mkdir → stage → copy → fsync → rename      │
//! │     GET: open → stream                                      │
//! └─────────────────────┬───────────────────────────────────────┘
//!                       │
//!                       ▼
//!               {storage_root}/{key}
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod keys;
pub mod storage;
pub mod network;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{StoreError, Result};
pub use config::Config;
pub use keys::{map_key_to_path, ObjectKey};
pub use storage::ObjectStore;

// =============================================================================
// Version Info
// =============================================================================

/// Current version of immustore
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
