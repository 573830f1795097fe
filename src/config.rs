//! Configuration for immustore
//!
//! Centralized configuration with sensible defaults. Built once at startup
//! and handed to the store and the HTTP layer.

use std::path::PathBuf;

use crate::error::{Result, StoreError};

/// Main configuration for an immustore instance
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Storage Configuration
    // -------------------------------------------------------------------------
    /// Root directory for all blobs
    /// Internal structure mirrors the keys:
    ///   {storage_root}/
    ///     ├── foo/bar          (blob for key "foo/bar")
    ///     └── foo/.staging-*   (in-flight writes, never visible as keys)
    pub storage_root: PathBuf,

    /// Publish with a no-clobber rename instead of a plain rename.
    /// When set, the loser of a same-key race gets `Conflict`.
    pub exclusive_publish: bool,

    /// fsync the parent directory after publishing (unix only)
    pub sync_directories: bool,

    // -------------------------------------------------------------------------
    // Network Configuration
    // -------------------------------------------------------------------------
    /// HTTP listen address
    pub listen_addr: String,

    /// Chunk size used when streaming blobs to clients (bytes)
    pub stream_chunk_size: usize,

    /// Largest accepted request body (bytes), unlimited when None
    pub max_object_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_root: PathBuf::from("./data/blobstore"),
            exclusive_publish: false,
            sync_directories: true,
            listen_addr: "0.0.0.0:7070".to_string(),
            stream_chunk_size: 64 * 1024, // 64 KiB
            max_object_size: None,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }

    /// Check the config for values the store cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.storage_root.as_os_str().is_empty() {
            return Err(StoreError::Config("storage root must not be empty".into()));
        }
        if self.stream_chunk_size == 0 {
            return Err(StoreError::Config("stream chunk size must be positive".into()));
        }
        if self.max_object_size == Some(0) {
            return Err(StoreError::Config("max object size must be positive".into()));
        }
        Ok(())
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the storage root (directory under which all blobs live)
    pub fn storage_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.storage_root = path.into();
        self
    }

    /// Use a no-clobber rename when publishing
    pub fn exclusive_publish(mut self, enabled: bool) -> Self {
        self.config.exclusive_publish = enabled;
        self
    }

    /// fsync parent directories after publishing
    pub fn sync_directories(mut self, enabled: bool) -> Self {
        self.config.sync_directories = enabled;
        self
    }

    /// Set the HTTP listen address
    pub fn listen_addr(mut self, addr: impl Into<String>) -> Self {
        self.config.listen_addr = addr.into();
        self
    }

    /// Set the streaming chunk size (in bytes)
    pub fn stream_chunk_size(mut self, size: usize) -> Self {
        self.config.stream_chunk_size = size;
        self
    }

    /// Set the maximum accepted object size (in bytes)
    pub fn max_object_size(mut self, size: Option<usize>) -> Self {
        self.config.max_object_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
