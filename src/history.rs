//! Walking the commit chain
//!
//! History is a singly linked list: every commit names at most one parent,
//! and HEAD names the newest commit.
//!
//! ```text
//! HEAD -> C3 -> C2 -> C1 -> (none)
//! ```
//!
//! [`History`] walks that list lazily, loading one commit per step. The
//! walk fails fast: the first link that cannot be resolved is yielded as a
//! [`VerxError::CorruptRecord`] and the iterator ends. A digest seen twice
//! in one walk can only come from a hand-edited object directory and is
//! reported the same way instead of looping forever.

use crate::commit::Commit;
use crate::error::{Result, VerxError};
use crate::storage::ObjectStore;
use crate::types::Digest;
use std::collections::HashSet;
use std::iter::FusedIterator;
use tracing::trace;

/// Lazy newest-to-oldest iterator over commits
#[derive(Debug)]
pub struct History<'a> {
    store: &'a ObjectStore,
    next: Option<Digest>,
    seen: HashSet<Digest>,
}

impl<'a> History<'a> {
    /// Start a walk at `start`; `None` yields an empty history
    pub fn new(store: &'a ObjectStore, start: Option<Digest>) -> Self {
        Self {
            store,
            next: start,
            seen: HashSet::new(),
        }
    }

    fn step(&mut self, digest: Digest) -> Result<(Digest, Commit)> {
        if !self.seen.insert(digest.clone()) {
            return Err(VerxError::corrupt(
                digest.as_str(),
                "commit chain loops back on itself",
            ));
        }

        let commit = self.store.load_commit(&digest).map_err(|e| match e {
            VerxError::ObjectNotFound(missing) => {
                VerxError::corrupt(missing, "commit chain link is missing from the object store")
            }
            other => other,
        })?;
        trace!("History visited {}", digest.short());
        self.next = commit.parent.clone();
        Ok((digest, commit))
    }
}

impl Iterator for History<'_> {
    type Item = Result<(Digest, Commit)>;

    fn next(&mut self) -> Option<Self::Item> {
        let digest = self.next.take()?;
        // `next` stays empty after an error, which ends the walk
        Some(self.step(digest))
    }
}

impl FusedIterator for History<'_> {}
