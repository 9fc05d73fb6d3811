//! Commit records and their canonical encoding
//!
//! A commit is an immutable snapshot of the staging index at the time it
//! was created, linked to at most one parent commit:
//!
//! ```text
//! C1 (parent: null) <- C2 (parent: C1) <- C3 (parent: C2) <- HEAD
//! ```
//!
//! ## Canonical Encoding
//!
//! A commit's identity is the SHA-256 of its serialized bytes, so the
//! encoding has to be stable. Commits are written as compact JSON with a
//! fixed field order:
//!
//! ```text
//! {"version":1,"timestamp":"...","message":"...","files":[{"path":"...","hash":"..."}],"parent":null}
//! ```
//!
//! Timestamps are truncated to milliseconds before encoding. Records that
//! predate the `version` field decode as version 1, and an empty-string
//! parent decodes as no parent.
//!
//! ## Examples
//!
//! ```rust
//! use verx::commit::Commit;
//! use verx::types::StagingEntry;
//! use verx::utils::hash_data;
//!
//! let files = vec![StagingEntry::new("hello.txt", hash_data(b"hello"))];
//! let commit = Commit::new("Initial commit", files, None);
//!
//! let bytes = commit.to_canonical_bytes().unwrap();
//! let digest = commit.digest().unwrap();
//! assert_eq!(digest, hash_data(&bytes));
//! ```

use crate::error::{Result, VerxError};
use crate::types::{Digest, StagingEntry};
use crate::utils;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Current commit encoding version
pub const COMMIT_FORMAT_VERSION: u32 = 1;

/// An immutable commit record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Encoding version
    #[serde(default = "legacy_version")]
    pub version: u32,
    /// Creation time (UTC, millisecond precision)
    #[serde(alias = "timeStamp")]
    pub timestamp: DateTime<Utc>,
    /// Commit message
    pub message: String,
    /// Staged entries at commit time, in staging order
    pub files: Vec<StagingEntry>,
    /// Parent commit, `None` for the root commit
    #[serde(default, deserialize_with = "deserialize_parent")]
    pub parent: Option<Digest>,
}

fn legacy_version() -> u32 {
    1
}

fn deserialize_parent<'de, D>(deserializer: D) -> std::result::Result<Option<Digest>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => Digest::parse(s).map(Some).map_err(serde::de::Error::custom),
    }
}

impl Commit {
    /// Create a commit stamped with the current time
    pub fn new(message: impl Into<String>, files: Vec<StagingEntry>, parent: Option<Digest>) -> Self {
        Self::with_timestamp(Utc::now(), message, files, parent)
    }

    /// Create a commit with an explicit timestamp
    ///
    /// The timestamp is truncated to milliseconds so that encoding and
    /// decoding it is lossless.
    pub fn with_timestamp(
        timestamp: DateTime<Utc>,
        message: impl Into<String>,
        files: Vec<StagingEntry>,
        parent: Option<Digest>,
    ) -> Self {
        Self {
            version: COMMIT_FORMAT_VERSION,
            timestamp: timestamp.trunc_subsecs(3),
            message: message.into(),
            files,
            parent,
        }
    }

    /// Serialize to the canonical byte form that is hashed and stored
    pub fn to_canonical_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Digest of the canonical encoding
    pub fn digest(&self) -> Result<Digest> {
        Ok(utils::hash_data(&self.to_canonical_bytes()?))
    }

    /// Canonical bytes together with their digest, hashed exactly once
    pub fn encode(&self) -> Result<(Digest, Vec<u8>)> {
        let bytes = self.to_canonical_bytes()?;
        Ok((utils::hash_data(&bytes), bytes))
    }

    /// Decode a stored commit
    ///
    /// # Errors
    ///
    /// - [`VerxError::CorruptRecord`] if the bytes are not a well-formed commit
    ///   or use an encoding version newer than this build understands
    pub fn from_bytes(digest: &Digest, bytes: &[u8]) -> Result<Self> {
        let commit: Commit = serde_json::from_slice(bytes)
            .map_err(|e| VerxError::corrupt(digest.as_str(), format!("not a commit record: {}", e)))?;

        if commit.version > COMMIT_FORMAT_VERSION {
            return Err(VerxError::corrupt(
                digest.as_str(),
                format!("unsupported commit version {}", commit.version),
            ));
        }

        Ok(commit)
    }

    /// Whether this commit starts the history
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// First entry recorded for `path`
    ///
    /// When a path was staged more than once, the earliest entry wins.
    pub fn find_file(&self, path: &str) -> Option<&StagingEntry> {
        self.files.iter().find(|entry| entry.path == path)
    }

    /// First line of the message, for one-line listings
    pub fn summary(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }
}
