//! Key Mapper
//!
//! Translates client-supplied object keys into paths under the storage root.
//!
//! ## Rules
//! - One leading `/` is stripped; an empty key is rejected
//! - Any `..` segment is rejected outright (before and regardless of normalization)
//! - `.` and empty segments are collapsed lexically, never via the filesystem
//! - The result must be a strict descendant of the storage root
//!
//! Mapping is pure: no directory is created or touched for a rejected key.

use std::fmt;
use std::path::{Component, Path, PathBuf};

use crate::error::{Result, StoreError};

/// Filename prefix reserved for staging files.
///
/// No key segment may start with it, so clients can neither read nor
/// collide with an in-flight write.
pub const STAGING_PREFIX: &str = ".staging-";

/// A validated, normalized object key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectKey(String);

impl ObjectKey {
    /// Validate and normalize a raw key
    pub fn parse(raw: &str) -> Result<Self> {
        normalize_key(raw).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of this key under `root`
    pub fn to_path(&self, root: &Path) -> Result<PathBuf> {
        resolve_under(root, &self.0)
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Normalize a raw key into `segment/segment/...` form
///
/// "foo//./bar" → "foo/bar", "/foo" → "foo", "../x" → InvalidKey
pub fn normalize_key(raw: &str) -> Result<String> {
    let key = raw.strip_prefix('/').unwrap_or(raw);

    if key.is_empty() {
        return Err(StoreError::invalid_key(raw, "key is empty"));
    }
    if key.contains('\0') {
        return Err(StoreError::invalid_key(raw, "key contains a NUL byte"));
    }
    // A backslash is a separator on some platforms and would slip past the
    // segment checks below
    if key.contains('\\') {
        return Err(StoreError::invalid_key(raw, "key contains a backslash"));
    }

    let mut segments = Vec::new();
    for segment in key.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                return Err(StoreError::invalid_key(
                    raw,
                    "key contains a parent-directory segment",
                ))
            }
            s if s.starts_with(STAGING_PREFIX) => {
                return Err(StoreError::invalid_key(raw, "key uses a reserved name"))
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return Err(StoreError::invalid_key(raw, "key is empty after normalization"));
    }

    Ok(segments.join("/"))
}

/// Map a raw key to its absolute location under `root`
///
/// Pure and deterministic: performs no I/O.
pub fn map_key_to_path(root: &Path, raw: &str) -> Result<PathBuf> {
    let normalized = normalize_key(raw)?;
    resolve_under(root, &normalized).map_err(|_| {
        StoreError::invalid_key(raw, "key resolves outside the storage root")
    })
}

/// Join a normalized key onto `root`, checking it stays strictly inside
fn resolve_under(root: &Path, normalized: &str) -> Result<PathBuf> {
    let relative = Path::new(normalized);

    // Drive prefixes or root components would make `join` discard `root`
    let all_normal = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)));
    if !all_normal {
        return Err(StoreError::invalid_key(
            normalized,
            "key resolves outside the storage root",
        ));
    }

    let path = root.join(relative);
    if path == root || !path.starts_with(root) {
        return Err(StoreError::invalid_key(
            normalized,
            "key resolves outside the storage root",
        ));
    }

    Ok(path)
}
