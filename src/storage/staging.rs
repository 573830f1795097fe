//! Staging Files
//!
//! A staging file buffers one in-flight write next to its target so the
//! final publish can be a same-filesystem rename.
//!
//! ## Lifecycle
//! ```text
//! create_in(dir) ──► fill_from(body) ──► sync() ──► publish(target)
//!        │                  │               │              │
//!        └──────────────────┴───────────────┴── drop ──► file removed
//! ```
//! Dropping a `StagingFile` at any point before a successful publish removes
//! it from disk, so early returns via `?` clean up without extra code.

use std::io::{self, Read};
use std::path::Path;

use tempfile::{Builder, NamedTempFile};

use crate::keys::STAGING_PREFIX;

/// Random characters appended to the staging prefix
const STAGING_RAND_LEN: usize = 16;

/// An exclusively owned, uniquely named temporary file
#[derive(Debug)]
pub struct StagingFile {
    /// Open handle; the path is deleted when this is dropped
    file: NamedTempFile,

    /// Bytes copied in so far
    bytes_written: u64,
}

impl StagingFile {
    /// Create a new staging file inside `dir`
    ///
    /// The name is `.staging-<random>`, created with O_EXCL semantics so two
    /// writers can never share one.
    pub fn create_in(dir: &Path) -> io::Result<Self> {
        let file = Builder::new()
            .prefix(STAGING_PREFIX)
            .rand_bytes(STAGING_RAND_LEN)
            .tempfile_in(dir)?;

        Ok(Self {
            file,
            bytes_written: 0,
        })
    }

    /// Path of the staging file on disk
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Bytes copied in so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Copy everything from `reader` into the staging file
    ///
    /// Uses `io::copy`, whose intermediate buffer is fixed-size, so memory
    /// stays bounded for arbitrarily large bodies.
    pub fn fill_from<R: Read + ?Sized>(&mut self, reader: &mut R) -> io::Result<u64> {
        let copied = io::copy(reader, self.file.as_file_mut())?;
        self.bytes_written += copied;
        Ok(copied)
    }

    /// Force contents to stable storage (fsync)
    pub fn sync(&mut self) -> io::Result<()> {
        self.file.as_file().sync_all()
    }

    /// Close the handle and atomically rename the file onto `target`
    ///
    /// With `exclusive`, the rename refuses to replace an existing target and
    /// fails with `ErrorKind::AlreadyExists`. On any error the staging file is
    /// removed before returning.
    pub fn publish(self, target: &Path, exclusive: bool) -> io::Result<()> {
        // into_temp_path closes the handle but keeps delete-on-drop
        let temp_path = self.file.into_temp_path();

        let persisted = if exclusive {
            temp_path.persist_noclobber(target)
        } else {
            temp_path.persist(target)
        };

        // PathPersistError owns the TempPath, dropping it removes the file
        persisted.map_err(|e| e.error)
    }
}

/// fsync a directory so a rename inside it survives a crash
#[cfg(unix)]
pub fn sync_dir(dir: &Path) -> io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

/// Directory handles cannot be fsynced here; renames are left to the OS
#[cfg(not(unix))]
pub fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}
