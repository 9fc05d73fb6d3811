//! The HEAD pointer
//!
//! `.verx/HEAD` holds the digest of the latest commit as plain text, or
//! nothing at all before the first commit. Only commit creation (and crash
//! recovery finishing a commit) moves it.

use crate::error::{Result, VerxError};
use crate::types::Digest;
use crate::utils;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Handle to the HEAD file
#[derive(Debug, Clone)]
pub struct Head {
    path: PathBuf,
}

impl Head {
    /// Create an empty HEAD file if none exists
    ///
    /// Returns `true` alongside the handle when the file was created.
    pub fn init(path: PathBuf) -> Result<(Self, bool)> {
        let created = if path.exists() {
            false
        } else {
            utils::atomic_write(&path, b"")?;
            true
        };
        Ok((Self { path }, created))
    }

    /// Open an existing HEAD file
    ///
    /// # Errors
    ///
    /// - [`VerxError::NotInitialized`] if the file does not exist
    pub fn open(path: PathBuf) -> Result<Self> {
        if !path.is_file() {
            let root = path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone());
            return Err(VerxError::NotInitialized { root, missing: "HEAD" });
        }
        Ok(Self { path })
    }

    /// Current commit digest
    ///
    /// A missing, empty, unreadable or malformed HEAD all mean "no history
    /// yet" and yield `None`. The last two are logged.
    pub fn read(&self) -> Option<Digest> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!("Failed to read HEAD at {:?}: {}", self.path, e);
                return None;
            }
        };

        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        match Digest::parse(trimmed) {
            Ok(digest) => Some(digest),
            Err(_) => {
                warn!("Ignoring malformed HEAD content {:?}", trimmed);
                None
            }
        }
    }

    /// Point HEAD at `digest`
    pub fn set(&self, digest: &Digest) -> Result<()> {
        utils::atomic_write(&self.path, digest.as_str().as_bytes())?;
        debug!("HEAD -> {}", digest.short());
        Ok(())
    }
}
