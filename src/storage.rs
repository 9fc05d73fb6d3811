//! Content-addressable object store for verx
//!
//! Every blob and every serialized commit lives in one flat directory,
//! one file per distinct digest:
//!
//! ```text
//! .verx/
//! └── objects/
//!     ├── 2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824
//!     └── <digest>              # raw bytes, never modified after creation
//! ```
//!
//! ## Content Addressing
//!
//! Objects are keyed by the SHA-256 of their bytes. Writing identical
//! content twice is a no-op, and the key doubles as an integrity check:
//! with `verify_on_read` enabled, [`ObjectStore::get`] re-hashes what it
//! reads and refuses bytes that no longer match their name.
//!
//! Objects are only ever created. There is no deletion, no rewrite and no
//! garbage collection, so unreachable objects accumulate.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use verx::storage::ObjectStore;
//! use std::path::PathBuf;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = ObjectStore::open(PathBuf::from(".verx/objects"), true)?;
//!
//! let digest = store.put(b"Hello, world!")?;
//! assert_eq!(store.get(&digest)?, b"Hello, world!");
//! # Ok(())
//! # }
//! ```

use crate::commit::Commit;
use crate::error::{Result, VerxError};
use crate::types::{Digest, StorageStats, DIGEST_LEN};
use crate::utils;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, trace};

/// Flat content-addressed object directory
#[derive(Debug, Clone)]
pub struct ObjectStore {
    /// Directory holding one file per object
    dir: PathBuf,
    /// Re-hash content on every read
    verify_on_read: bool,
}

impl ObjectStore {
    /// Create the object directory (if needed) and return a store for it
    pub fn init(dir: PathBuf, verify_on_read: bool) -> Result<Self> {
        fs::create_dir_all(&dir)?;
        info!("Initialized object store at {:?}", dir);
        Ok(Self { dir, verify_on_read })
    }

    /// Open an existing object directory
    ///
    /// # Errors
    ///
    /// - [`VerxError::NotInitialized`] if the directory does not exist
    pub fn open(dir: PathBuf, verify_on_read: bool) -> Result<Self> {
        if !dir.is_dir() {
            let root = dir.parent().map(Path::to_path_buf).unwrap_or_else(|| dir.clone());
            return Err(VerxError::NotInitialized {
                root,
                missing: "objects",
            });
        }
        Ok(Self { dir, verify_on_read })
    }

    /// Store content and return its digest
    ///
    /// Idempotent: if an object with the same digest already exists the
    /// write is skipped and the existing digest returned.
    ///
    /// # Errors
    ///
    /// - [`VerxError::Io`] if the object file cannot be written
    pub fn put(&self, content: &[u8]) -> Result<Digest> {
        let digest = utils::hash_data(content);
        self.write_at(&digest, content)?;
        Ok(digest)
    }

    /// Write content under a digest computed by the caller
    ///
    /// Used for commit records, which are hashed exactly once when they are
    /// built. The caller guarantees `digest == hash_data(content)`.
    pub(crate) fn write_at(&self, digest: &Digest, content: &[u8]) -> Result<()> {
        debug_assert_eq!(&utils::hash_data(content), digest);

        let object_path = self.object_path(digest);
        if object_path.exists() {
            trace!("Object {} already exists, skipping write", digest.short());
            return Ok(());
        }

        utils::atomic_write(&object_path, content)?;
        trace!("Stored object {} ({} bytes)", digest.short(), content.len());
        Ok(())
    }

    /// Load object content by digest
    ///
    /// # Errors
    ///
    /// - [`VerxError::ObjectNotFound`] if no object has this digest
    /// - [`VerxError::HashMismatch`] if verification is on and the bytes changed
    /// - [`VerxError::Io`] if the file cannot be read
    pub fn get(&self, digest: &Digest) -> Result<Vec<u8>> {
        let object_path = self.object_path(digest);
        let content = match fs::read(&object_path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VerxError::ObjectNotFound(digest.to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if self.verify_on_read {
            let actual = utils::hash_data(&content);
            if &actual != digest {
                return Err(VerxError::HashMismatch {
                    expected: digest.to_string(),
                    actual: actual.to_string(),
                });
            }
        }

        trace!("Loaded object {} ({} bytes)", digest.short(), content.len());
        Ok(content)
    }

    /// Load and decode a commit record
    ///
    /// # Errors
    ///
    /// - [`VerxError::ObjectNotFound`] if no object has this digest
    /// - [`VerxError::CorruptRecord`] if the object is not a commit
    pub fn load_commit(&self, digest: &Digest) -> Result<Commit> {
        let bytes = self.get(digest)?;
        Commit::from_bytes(digest, &bytes)
    }

    /// Encode and store a commit, returning its digest
    ///
    /// The digest is computed once over the canonical encoding and the bytes
    /// are written under it.
    pub fn store_commit(&self, commit: &Commit) -> Result<Digest> {
        let (digest, bytes) = commit.encode()?;
        self.write_at(&digest, &bytes)?;
        debug!("Stored commit {}", digest.short());
        Ok(digest)
    }

    /// Check if an object exists
    pub fn contains(&self, digest: &Digest) -> bool {
        self.object_path(digest).is_file()
    }

    /// Re-hash a stored object and compare with its key
    ///
    /// Runs regardless of the `verify_on_read` setting.
    pub fn verify(&self, digest: &Digest) -> Result<()> {
        let content = match fs::read(self.object_path(digest)) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(VerxError::ObjectNotFound(digest.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        let actual = utils::hash_data(&content);
        if &actual != digest {
            return Err(VerxError::HashMismatch {
                expected: digest.to_string(),
                actual: actual.to_string(),
            });
        }
        Ok(())
    }

    /// List all stored digests, sorted
    ///
    /// Files whose names are not well-formed digests (for example a
    /// leftover temporary file) are skipped.
    pub fn list(&self) -> Result<Vec<Digest>> {
        let mut objects = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            if name.len() != DIGEST_LEN {
                continue;
            }
            if let Ok(digest) = Digest::parse(&name) {
                objects.push(digest);
            }
        }
        objects.sort();
        Ok(objects)
    }

    /// Resolve an abbreviated digest to the unique object it names
    ///
    /// A full-length digest is returned as-is when it exists.
    ///
    /// # Errors
    ///
    /// - [`VerxError::InvalidDigest`] if the prefix is empty or not hex
    /// - [`VerxError::ObjectNotFound`] if nothing matches
    /// - [`VerxError::AmbiguousDigest`] if several objects match
    pub fn resolve_prefix(&self, prefix: &str) -> Result<Digest> {
        let prefix = prefix.trim().to_ascii_lowercase();
        if prefix.is_empty()
            || prefix.len() > DIGEST_LEN
            || !prefix.bytes().all(|b| b.is_ascii_hexdigit())
        {
            return Err(VerxError::InvalidDigest(prefix));
        }

        if prefix.len() == DIGEST_LEN {
            let digest = Digest::parse(&prefix)?;
            return if self.contains(&digest) {
                Ok(digest)
            } else {
                Err(VerxError::ObjectNotFound(prefix))
            };
        }

        let mut matches: Vec<Digest> = self
            .list()?
            .into_iter()
            .filter(|d| d.as_str().starts_with(&prefix))
            .collect();

        match matches.len() {
            0 => Err(VerxError::ObjectNotFound(prefix)),
            1 => Ok(matches.remove(0)),
            count => {
                debug!("Prefix {} matches {} objects", prefix, count);
                Err(VerxError::AmbiguousDigest { prefix, count })
            }
        }
    }

    /// Object count and total size on disk
    pub fn stats(&self) -> Result<StorageStats> {
        let mut stats = StorageStats::default();
        for digest in self.list()? {
            stats.object_count += 1;
            stats.total_size += fs::metadata(self.object_path(&digest))?.len();
        }
        Ok(stats)
    }

    /// Directory holding the objects
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Get path for an object
    fn object_path(&self, digest: &Digest) -> PathBuf {
        self.dir.join(digest.as_str())
    }
}
