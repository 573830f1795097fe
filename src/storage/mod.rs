//! Storage Module
//!
//! Write-once blob storage on a local filesystem.
//!
//! ## Responsibilities
//! - Durable, atomic PUT (stage → fsync → rename)
//! - Existence-checked, streaming GET
//! - Scoped cleanup of staging files on every failure path
//!
//! ## On-disk Layout
//! ```text
//! {storage_root}/
//! ├── foo/
//! │   ├── bar                  blob for key "foo/bar"
//! │   └── .staging-3fa9c1...   in-flight write (never a valid key)
//! └── readme.txt               blob for key "readme.txt"
//! ```
//! The directory tree is the index; there is no manifest.

mod staging;
mod store;

pub use staging::StagingFile;
pub use store::{ObjectStore, OpenObject, PutReceipt};
