//! Core data types used throughout the verx library
//!
//! ## Overview
//!
//! The types in this module represent:
//! - **Addressing**: [`Digest`] - the content hash every object is stored under
//! - **Staging**: [`StagingEntry`] - one pending `(path, digest)` pair
//! - **Configuration**: [`RepositoryConfig`], [`RepositoryMetadata`] - persisted settings
//! - **Results**: [`CommitDiff`], [`FileDiff`], [`StorageStats`] - outputs of operations
//!
//! ## Examples
//!
//! ```rust
//! use verx::types::Digest;
//!
//! let digest: Digest = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
//!     .parse()
//!     .unwrap();
//! assert_eq!(digest.short(), "2cf24dba");
//! ```

use crate::commit::Commit;
use crate::diff::{DiffPart, DiffStats};
use crate::error::{Result, VerxError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of hex characters in a digest (SHA-256)
pub const DIGEST_LEN: usize = 64;

/// On-disk repository format understood by this build
pub const REPOSITORY_FORMAT_VERSION: u32 = 1;

/// Number of characters shown for abbreviated digests
pub const SHORT_DIGEST_LEN: usize = 8;

/// Content digest used as the key of every stored object
///
/// A lowercase hexadecimal SHA-256 string. Blobs and commits share the
/// same digest space; only the caller knows how to interpret the bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    /// Parse and validate a full-length digest
    ///
    /// # Errors
    ///
    /// - [`VerxError::InvalidDigest`] if the string is not 64 hex characters
    pub fn parse(s: &str) -> Result<Self> {
        let normalized = s.trim().to_ascii_lowercase();
        if normalized.len() != DIGEST_LEN || !normalized.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(VerxError::InvalidDigest(s.to_string()));
        }
        Ok(Self(normalized))
    }

    /// Wrap a string already known to be a lowercase hex digest
    pub(crate) fn from_hex_unchecked(hex: String) -> Self {
        debug_assert_eq!(hex.len(), DIGEST_LEN);
        Self(hex)
    }

    /// Full digest string
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Abbreviated form used in log output
    pub fn short(&self) -> &str {
        &self.0[..SHORT_DIGEST_LEN]
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Digest {
    type Err = VerxError;

    fn from_str(s: &str) -> Result<Self> {
        Digest::parse(s)
    }
}

impl TryFrom<String> for Digest {
    type Error = VerxError;

    fn try_from(value: String) -> Result<Self> {
        Digest::parse(&value)
    }
}

impl From<Digest> for String {
    fn from(digest: Digest) -> Self {
        digest.0
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One pending change in the staging index
///
/// The index is an ordered list of these. A path staged twice before a
/// commit appears twice; nothing deduplicates it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StagingEntry {
    /// Path as recorded at `add` time (worktree-relative when possible)
    pub path: String,
    /// Digest of the file content at `add` time
    pub hash: Digest,
}

impl StagingEntry {
    /// Create a new staging entry
    pub fn new(path: impl Into<String>, hash: Digest) -> Self {
        Self {
            path: path.into(),
            hash,
        }
    }
}

/// Behavioural settings for a repository
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// Allow `commit` with an empty staging index (produces a zero-file commit)
    pub allow_empty_commits: bool,
    /// Re-hash objects on every read and fail on mismatch
    pub verify_on_read: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            allow_empty_commits: false,
            verify_on_read: true,
        }
    }
}

/// Metadata stored in `config.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryMetadata {
    /// Version of the on-disk format
    pub format_version: u32,
    /// verx version that created the repository
    pub verx_version: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Configuration
    pub config: RepositoryConfig,
}

impl RepositoryMetadata {
    /// Metadata for a freshly created repository
    pub fn new(config: RepositoryConfig) -> Self {
        Self {
            format_version: REPOSITORY_FORMAT_VERSION,
            verx_version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
            config,
        }
    }
}

/// Object store statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of stored objects (blobs and commits)
    pub object_count: usize,
    /// Total bytes across all objects
    pub total_size: u64,
}

/// What happened to one file in a commit relative to its parent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileChange {
    /// The commit has no parent; nothing to diff against
    Initial,
    /// No entry with this path exists in the parent commit
    New,
    /// Either side is binary content; not diffed
    Binary,
    /// The path exists in the parent; line diff from parent to this commit
    Modified {
        /// Coalesced diff parts in order
        parts: Vec<DiffPart>,
        /// Line counts for the parts
        stats: DiffStats,
    },
}

/// One file of a commit along with its change classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDiff {
    /// Path as staged
    pub path: String,
    /// Digest of the content in this commit
    pub hash: Digest,
    /// Content in this commit (lossy UTF-8)
    pub content: String,
    /// Comparison against the parent
    pub change: FileChange,
}

/// Result of comparing a commit with its parent
#[derive(Debug, Clone)]
pub struct CommitDiff {
    /// Digest of the commit that was shown
    pub digest: Digest,
    /// The commit itself
    pub commit: Commit,
    /// Per-file results, in the commit's file order
    pub files: Vec<FileDiff>,
}

impl CommitDiff {
    /// Whether this is a root commit with nothing to compare against
    pub fn is_initial(&self) -> bool {
        self.commit.parent.is_none()
    }

    /// Total lines added and removed across all modified files
    pub fn total_stats(&self) -> DiffStats {
        self.files
            .iter()
            .filter_map(|f| match &f.change {
                FileChange::Modified { stats, .. } => Some(*stats),
                _ => None,
            })
            .fold(DiffStats::default(), |acc, s| DiffStats {
                lines_added: acc.lines_added + s.lines_added,
                lines_removed: acc.lines_removed + s.lines_removed,
            })
    }
}
