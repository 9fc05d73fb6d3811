//! Staging index for the next commit
//!
//! The index is an ordered list of [`StagingEntry`] values persisted as a
//! JSON array in `.verx/index`. Each mutation rewrites the file atomically
//! before returning, so the staged set survives across process runs.
//!
//! Order is call order. Staging the same path twice keeps both entries;
//! nothing is deduplicated or overwritten.

use crate::error::{Result, VerxError};
use crate::types::{Digest, StagingEntry};
use crate::utils;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Persistent, ordered staging list
#[derive(Debug, Clone)]
pub struct StagingIndex {
    /// Path of the index file
    path: PathBuf,
}

impl StagingIndex {
    /// Create an empty index file if none exists and return a handle to it
    ///
    /// Returns `true` alongside the handle when the file was created.
    pub fn init(path: PathBuf) -> Result<(Self, bool)> {
        let created = if path.exists() {
            false
        } else {
            utils::atomic_write(&path, b"[]")?;
            true
        };
        Ok((Self { path }, created))
    }

    /// Open an existing index file
    ///
    /// # Errors
    ///
    /// - [`VerxError::NotInitialized`] if the file does not exist
    pub fn open(path: PathBuf) -> Result<Self> {
        if !path.is_file() {
            let root = path.parent().map(Path::to_path_buf).unwrap_or_else(|| path.clone());
            return Err(VerxError::NotInitialized {
                root,
                missing: "index",
            });
        }
        Ok(Self { path })
    }

    /// Append an entry
    pub fn stage(&self, path: impl Into<String>, hash: Digest) -> Result<StagingEntry> {
        let entry = StagingEntry::new(path, hash);
        let mut entries = self.load()?;
        entries.push(entry.clone());
        self.save(&entries)?;

        debug!("Staged {} ({})", entry.path, entry.hash.short());
        Ok(entry)
    }

    /// Copy of the current entries in staging order
    pub fn snapshot(&self) -> Result<Vec<StagingEntry>> {
        self.load()
    }

    /// Remove all entries
    pub fn clear(&self) -> Result<()> {
        self.save(&[])?;
        trace!("Cleared staging index");
        Ok(())
    }

    /// Number of staged entries
    pub fn len(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }

    /// Whether nothing is staged
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.load()?.is_empty())
    }

    fn load(&self) -> Result<Vec<StagingEntry>> {
        let data = fs::read(&self.path)?;
        // An empty file reads as an empty index
        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }
        serde_json::from_slice(&data).map_err(|e| VerxError::corrupt("index", e.to_string()))
    }

    fn save(&self, entries: &[StagingEntry]) -> Result<()> {
        let json = serde_json::to_vec(entries)?;
        utils::atomic_write(&self.path, &json)
    }
}
