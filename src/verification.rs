//! Repository verification and integrity checking
//!
//! Verification walks the history from HEAD and checks, for every commit it
//! reaches:
//!
//! 1. **Commit object**: present, re-hashes to its digest, decodes as a commit
//! 2. **Blobs**: every file entry's digest is present and re-hashes correctly
//! 3. **Chain**: the parent link resolves, down to a root commit
//!
//! Problems are collected into a [`VerificationReport`] rather than raised,
//! so one run lists everything that is wrong. A broken link stops the walk
//! since nothing behind it is reachable.
//!
//! Objects that no commit reaches are counted but are not errors: staging a
//! file and never committing it leaves one behind, and nothing collects them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use verx::Repository;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let repo = Repository::open(".")?;
//! let report = repo.verify()?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```

use crate::error::Result;
use crate::history::History;
use crate::storage::ObjectStore;
use crate::types::Digest;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Verifier for the objects reachable from a commit
#[derive(Debug)]
pub struct RepositoryVerifier<'a> {
    store: &'a ObjectStore,
}

impl<'a> RepositoryVerifier<'a> {
    /// Create a verifier over `store`
    pub fn new(store: &'a ObjectStore) -> Self {
        Self { store }
    }

    /// Verify everything reachable from `head`
    ///
    /// Only listing the object directory can fail outright; every other
    /// problem lands in the report.
    pub fn verify_history(&self, head: Option<&Digest>) -> Result<VerificationReport> {
        let start = Instant::now();
        let mut report = VerificationReport::default();
        let mut reachable: HashSet<Digest> = HashSet::new();

        for step in History::new(self.store, head.cloned()) {
            let (digest, commit) = match step {
                Ok(step) => step,
                Err(e) => {
                    warn!("History walk stopped: {}", e);
                    report.errors.push(e.to_string());
                    break;
                }
            };

            report.commits_checked += 1;
            if let Err(e) = self.store.verify(&digest) {
                report.errors.push(format!("commit {}: {}", digest.short(), e));
            }
            reachable.insert(digest.clone());

            for entry in &commit.files {
                if !reachable.insert(entry.hash.clone()) {
                    continue;
                }
                report.blobs_checked += 1;
                if let Err(e) = self.store.verify(&entry.hash) {
                    report.errors.push(format!(
                        "{} in commit {}: {}",
                        entry.path,
                        digest.short(),
                        e
                    ));
                }
            }
            debug!("Verified commit {} ({} files)", digest.short(), commit.files.len());
        }

        report.unreachable_objects = self
            .store
            .list()?
            .iter()
            .filter(|d| !reachable.contains(*d))
            .count();
        report.verification_time_ms = start.elapsed().as_millis() as u64;

        info!("{}", report.summary());
        Ok(report)
    }
}

/// Result of verifying a repository
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    /// Commits reached from HEAD
    pub commits_checked: usize,
    /// Distinct blobs referenced by those commits
    pub blobs_checked: usize,
    /// Stored objects not reachable from HEAD
    pub unreachable_objects: usize,
    /// Problems found, one line each
    pub errors: Vec<String>,
    /// Time taken in milliseconds
    pub verification_time_ms: u64,
}

impl VerificationReport {
    /// Whether no problems were found
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// One-line summary of the verification
    pub fn summary(&self) -> String {
        if self.is_valid() {
            format!(
                "Repository is valid: {} commits and {} blobs verified in {}ms",
                self.commits_checked, self.blobs_checked, self.verification_time_ms
            )
        } else {
            format!(
                "Repository has issues: {} errors across {} commits and {} blobs",
                self.errors.len(),
                self.commits_checked,
                self.blobs_checked
            )
        }
    }
}
