//! Utility functions for verx
//!
//! Hashing, atomic file writes and path helpers shared by the storage,
//! index and head modules.

use crate::error::{Result, VerxError};
use crate::types::Digest;
use sha2::{Digest as _, Sha256};
use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tempfile::NamedTempFile;

/// Hash arbitrary data with SHA-256
///
/// This is the single hash function of the repository: blobs and
/// serialized commits are both addressed by it.
///
/// # Example
///
/// ```rust
/// use verx::utils::hash_data;
///
/// let hash = hash_data(b"hello");
/// assert_eq!(hash.as_str().len(), 64);
///
/// // Same data always produces the same hash
/// assert_eq!(hash, hash_data(b"hello"));
/// ```
pub fn hash_data(data: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Digest::from_hex_unchecked(hex::encode(hasher.finalize()))
}

/// Atomic file write (write to temp file then rename)
///
/// The temporary file is created next to the target so the final rename
/// never crosses a filesystem boundary. Readers see either the old content
/// or the new content, never a partial write.
///
/// # Errors
///
/// - [`VerxError::Io`] if the temporary file cannot be written or renamed
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| VerxError::internal(format!("Path {:?} has no parent directory", path)))?;

    let mut temp = NamedTempFile::new_in(dir)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| VerxError::Io(e.error))?;

    Ok(())
}

/// Make `path` relative to `base`
///
/// Tries a lexical strip first, then falls back to canonicalising both
/// sides. Fails if `path` does not live under `base`.
pub fn make_relative(path: &Path, base: &Path) -> Result<PathBuf> {
    if let Ok(relative) = path.strip_prefix(base) {
        return Ok(relative.to_path_buf());
    }

    let path_canon = path.canonicalize()?;
    let base_canon = base.canonicalize()?;

    path_canon
        .strip_prefix(&base_canon)
        .map(|p| p.to_path_buf())
        .map_err(|_| VerxError::internal(format!(
            "Path {:?} is not relative to {:?}",
            path_canon, base_canon
        )))
}

/// Render a path the way it is recorded in the staging index
///
/// Separators are normalised to `/` so entries compare equal across
/// platforms.
pub fn path_to_entry(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Lexically resolve `.` and `..` components
///
/// Does not touch the filesystem. A `..` with nothing left to pop is kept
/// for relative paths and dropped at the root.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => normalized.push(".."),
            },
            other => normalized.push(other.as_os_str()),
        }
    }
    normalized
}

/// Read a whole file, mapping a missing file to [`VerxError::PathNotFound`]
pub fn read_source_file(path: &Path) -> Result<Vec<u8>> {
    match fs::read(path) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(VerxError::PathNotFound(path.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Format bytes in human-readable form
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB", "PB"];
    let mut size = bytes as f64;
    let mut unit_idx = 0;

    while size >= 1024.0 && unit_idx < UNITS.len() - 1 {
        size /= 1024.0;
        unit_idx += 1;
    }

    if unit_idx == 0 {
        format!("{} {}", size as u64, UNITS[unit_idx])
    } else {
        format!("{:.2} {}", size, UNITS[unit_idx])
    }
}
