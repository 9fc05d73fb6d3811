//! Error types for the verx library
//!
//! This module defines all error types that can occur during repository operations.
//! Errors carry the offending digest or path so a caller can tell which object or
//! file an operation tripped over.

use std::path::PathBuf;
use thiserror::Error;

/// Type alias for Results in the verx library
pub type Result<T> = std::result::Result<T, VerxError>;

/// Main error type for all verx operations
#[derive(Debug, Error)]
pub enum VerxError {
    /// I/O errors during object, index or head access
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors during JSON serialization/deserialization
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Repository scaffolding already exists
    #[error("Repository already initialized at {0:?}")]
    AlreadyInitialized(PathBuf),

    /// Repository root or one of its sub-resources is missing
    #[error("Not a verx repository (or missing {missing}): {root:?}")]
    NotInitialized {
        /// Repository directory that was probed
        root: PathBuf,
        /// Name of the missing resource
        missing: &'static str,
    },

    /// Object not found in the object store
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// File passed to `add` does not exist
    #[error("Path not found: {0:?}")]
    PathNotFound(PathBuf),

    /// Stored bytes do not decode as the expected record
    #[error("Corrupt record {digest}: {reason}")]
    CorruptRecord {
        /// Digest (or resource name) of the offending record
        digest: String,
        /// What went wrong while decoding it
        reason: String,
    },

    /// Stored content no longer hashes to its key
    #[error("Hash mismatch - expected: {expected}, actual: {actual}")]
    HashMismatch {
        /// Digest the object is stored under
        expected: String,
        /// Digest of the bytes actually read
        actual: String,
    },

    /// Nothing is staged and empty commits are disabled
    #[error("Nothing staged to commit")]
    EmptyIndex,

    /// A string is not a well-formed digest
    #[error("Invalid digest: {0:?}")]
    InvalidDigest(String),

    /// An abbreviated digest matches more than one object
    #[error("Ambiguous digest prefix {prefix:?} matches {count} objects")]
    AmbiguousDigest {
        /// The abbreviation that was looked up
        prefix: String,
        /// Number of objects sharing it
        count: usize,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Generic error for unexpected conditions
    #[error("Internal error: {0}")]
    Internal(String),
}

impl VerxError {
    /// Create an internal error with a custom message
    pub fn internal(msg: impl Into<String>) -> Self {
        VerxError::Internal(msg.into())
    }

    /// Create a corrupt-record error for the given digest
    pub fn corrupt(digest: impl Into<String>, reason: impl Into<String>) -> Self {
        VerxError::CorruptRecord {
            digest: digest.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error indicates corruption
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            VerxError::CorruptRecord { .. } | VerxError::HashMismatch { .. }
        )
    }

    /// Check if this error means something looked up does not exist
    pub fn is_not_found(&self) -> bool {
        match self {
            VerxError::ObjectNotFound(_) | VerxError::PathNotFound(_) => true,
            VerxError::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Get a user-friendly error message with suggestions
    pub fn user_message(&self) -> String {
        match self {
            VerxError::NotInitialized { root, .. } => {
                format!("No repository at {:?}. Run 'verx init' first.", root)
            }
            VerxError::ObjectNotFound(digest) => {
                format!("Object '{}' not found. Use 'verx log' to see available commits.", digest)
            }
            VerxError::PathNotFound(path) => {
                format!("Cannot add {:?}: no such file.", path)
            }
            VerxError::EmptyIndex => {
                "Nothing to commit. Stage files with 'verx add <path>' first.".to_string()
            }
            VerxError::AmbiguousDigest { prefix, .. } => {
                format!("Prefix '{}' is ambiguous. Use more characters of the digest.", prefix)
            }
            _ => self.to_string(),
        }
    }
}
