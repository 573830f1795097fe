//! Object Store
//!
//! Write-once PUT and streaming GET against paths produced by the key mapper.
//!
//! ## PUT state machine
//! 1. Existence check (best effort) → `Conflict`
//! 2. Create parent directories (idempotent)
//! 3. Stage: unique file in the target's directory
//! 4. Transfer body into the staging file
//! 5. fsync the staging file
//! 6. Close + atomic rename onto the target, then fsync the directory
//!
//! Any failure before step 6 completes drops the staging file, which removes
//! it; the target key stays absent and a retry is safe.
//!
//! ## Concurrency
//! No locks. Two PUTs racing on one key can both pass step 1; with the
//! default plain rename the last one to publish wins and both report success.
//! Readers still only ever see one complete payload because the rename is
//! atomic. `Config::exclusive_publish` closes the race with a no-clobber rename.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::keys::ObjectKey;

use super::staging::{sync_dir, StagingFile};

/// Outcome of a successful PUT
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutReceipt {
    /// Normalized key the blob was stored under
    pub key: ObjectKey,

    /// Final location on disk
    pub path: PathBuf,

    /// Bytes stored
    pub size: u64,
}

/// A blob opened for reading, after the existence check
#[derive(Debug)]
pub struct OpenObject {
    pub file: File,
    pub path: PathBuf,
    pub size: u64,
}

/// Filesystem-backed, write-once object store
///
/// Holds no mutable state; all methods take `&self` and can run concurrently
/// from any number of threads.
#[derive(Debug, Clone)]
pub struct ObjectStore {
    config: Config,
}

impl ObjectStore {
    /// Open or create a store rooted at `config.storage_root`
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;

        fs::create_dir_all(&config.storage_root)
            .map_err(|e| StoreError::write(&config.storage_root, e))?;

        tracing::debug!(root = %config.storage_root.display(), "Object store opened");

        Ok(Self { config })
    }

    /// Storage root directory
    pub fn root(&self) -> &Path {
        &self.config.storage_root
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Map a raw key to its path without touching the filesystem
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        crate::keys::map_key_to_path(self.root(), key)
    }

    // =========================================================================
    // PUT
    // =========================================================================

    /// Store `body` under `key`, exactly once
    ///
    /// Returns:
    /// - `Ok(receipt)` — blob fully written, durable and visible
    /// - `Err(InvalidKey)` — nothing touched on disk
    /// - `Err(Conflict)` — key already holds a blob, which is left unchanged
    /// - `Err(Write)` — I/O failure, key still absent
    pub fn put<R: Read>(&self, key: &str, body: R) -> Result<PutReceipt> {
        let key = ObjectKey::parse(key)?;
        let path = key.to_path(self.root())?;

        let size = self.write_object(key.as_str(), &path, body)?;

        Ok(PutReceipt { key, path, size })
    }

    /// Store `body` at an already-mapped `path`
    pub fn put_path<R: Read>(&self, path: &Path, body: R) -> Result<u64> {
        let label = path.display().to_string();
        self.write_object(&label, path, body)
    }

    fn write_object<R: Read>(&self, key: &str, path: &Path, mut body: R) -> Result<u64> {
        let start = Instant::now();

        // Step 1: immutability check
        match fs::symlink_metadata(path) {
            Ok(_) => {
                return Err(StoreError::Conflict {
                    key: key.to_string(),
                })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::write(path, e)),
        }

        // Step 2: parent directories (create_dir_all tolerates existing ones)
        let dir = path
            .parent()
            .ok_or_else(|| StoreError::write(path, io::Error::other("object path has no parent")))?;
        fs::create_dir_all(dir).map_err(|e| StoreError::write(dir, e))?;

        // Step 3: staging file next to the target (same filesystem for rename)
        let mut staging = StagingFile::create_in(dir).map_err(|e| StoreError::write(dir, e))?;

        // Step 4: transfer
        let size = staging
            .fill_from(&mut body)
            .map_err(|e| StoreError::write(staging.path(), e))?;

        // Step 5: durability
        staging
            .sync()
            .map_err(|e| StoreError::write(staging.path(), e))?;

        // Step 6: publish
        staging
            .publish(path, self.config.exclusive_publish)
            .map_err(|e| {
                if e.kind() == io::ErrorKind::AlreadyExists {
                    StoreError::Conflict {
                        key: key.to_string(),
                    }
                } else {
                    StoreError::write(path, e)
                }
            })?;

        // The blob is already visible; a failed directory sync only weakens
        // crash durability of the new name
        if self.config.sync_directories {
            if let Err(e) = sync_dir(dir) {
                tracing::warn!(dir = %dir.display(), error = %e, "Directory sync failed");
            }
        }

        tracing::info!(
            key = %key,
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object stored"
        );

        Ok(size)
    }

    // =========================================================================
    // GET
    // =========================================================================

    /// Stream the blob stored under `key` into `sink`
    ///
    /// Memory use is bounded by `io::copy`'s buffer regardless of blob size.
    /// If the copy fails after some bytes reached `sink`, the partial output
    /// cannot be taken back; the error is logged and returned as `Read`.
    pub fn get<W: Write + ?Sized>(&self, key: &str, sink: &mut W) -> Result<u64> {
        let key = ObjectKey::parse(key)?;
        let path = key.to_path(self.root())?;
        self.read_object(key.as_str(), &path, sink)
    }

    fn read_object<W: Write + ?Sized>(&self, key: &str, path: &Path, sink: &mut W) -> Result<u64> {
        let start = Instant::now();
        let mut object = Self::open_at(key, path)?;

        let copied = io::copy(&mut object.file, sink).map_err(|e| {
            tracing::error!(
                key = %key,
                path = %path.display(),
                error = %e,
                "Object stream interrupted"
            );
            StoreError::read(path, e)
        })?;

        tracing::debug!(
            key = %key,
            size_bytes = copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Object read"
        );

        Ok(copied)
    }

    /// Open the blob under `key` for streaming elsewhere
    ///
    /// Absence (including a directory at the key's path) is `NotFound`.
    pub fn open_object(&self, key: &str) -> Result<OpenObject> {
        let key = ObjectKey::parse(key)?;
        let path = key.to_path(self.root())?;
        Self::open_at(key.as_str(), &path)
    }

    fn open_at(key: &str, path: &Path) -> Result<OpenObject> {
        let not_found = || StoreError::NotFound {
            key: key.to_string(),
        };

        let file = match File::open(path) {
            Ok(f) => f,
            // A blob where a directory was expected also means "no such key"
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
                ) =>
            {
                return Err(not_found())
            }
            Err(e) => return Err(StoreError::read(path, e)),
        };

        let metadata = file.metadata().map_err(|e| StoreError::read(path, e))?;
        if !metadata.is_file() {
            return Err(not_found());
        }

        Ok(OpenObject {
            file,
            path: path.to_path_buf(),
            size: metadata.len(),
        })
    }

    /// Whether a blob is stored under `key`
    pub fn exists(&self, key: &str) -> Result<bool> {
        let path = self.path_for(key)?;
        match fs::metadata(&path) {
            Ok(m) => Ok(m.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::read(path, e)),
        }
    }
}
