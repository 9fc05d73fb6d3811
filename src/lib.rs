//! # verx - a minimal local version control engine
//!
//! verx stores file snapshots content-addressably, keeps a staging list of
//! pending changes, builds an immutable linear commit history and shows
//! line-level diffs between a commit and its parent.
//!
//! ## Overview
//!
//! verx provides a small Git-like workflow for a single local user:
//! - Stage files into an index that survives across runs
//! - Commit the staged set as an immutable, hash-identified record
//! - Walk the history from the newest commit back to the first
//! - Show what each file in a commit changed relative to its parent
//! - Verify that every stored object still matches its digest
//!
//! There is no branching, merging, networking or garbage collection.
//!
//! ## Architecture
//!
//! - **Content-Addressable Storage**: blobs and commit records are stored
//!   under their SHA-256 digest, so identical content is stored once
//! - **Staging Index**: an ordered JSON list of `(path, digest)` entries
//! - **Commit Graph**: each commit names at most one parent; `HEAD` names
//!   the newest commit
//! - **Diff Engine**: an LCS-based line diff classifying lines as
//!   unchanged, added or removed
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use verx::{FileChange, Repository};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut repo = Repository::init("./my_project")?;
//!
//! repo.add("notes.txt")?;
//! let first = repo.commit("Initial notes")?;
//!
//! // ...edit notes.txt...
//! repo.add("notes.txt")?;
//! let second = repo.commit("Expand notes")?;
//!
//! for file in repo.show_commit_diff(&second)?.files {
//!     if let FileChange::Modified { stats, .. } = file.change {
//!         println!("{}: +{} -{}", file.path, stats.lines_added, stats.lines_removed);
//!     }
//! }
//! # let _ = first;
//! # Ok(())
//! # }
//! ```
//!
//! ## On-Disk Layout
//!
//! ```text
//! <worktree>/.verx/
//! ├── objects/<digest>    # blobs and commit records
//! ├── HEAD                # digest of the newest commit, or empty
//! ├── index               # staged entries as a JSON array
//! └── config.json         # repository metadata and configuration
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, VerxError>`. Errors name the digest or
//! path they concern, and [`VerxError::user_message`] adds a hint for the
//! common cases.
//!
//! ## Module Organization
//!
//! - [`repository`]: The repository handle and its builder
//! - [`storage`]: Content-addressable object store
//! - [`index`]: Staging index
//! - [`head`]: The HEAD pointer
//! - [`commit`]: Commit records and their canonical encoding
//! - [`history`]: Lazy history traversal
//! - [`diff`]: Line diff engine
//! - [`verification`]: Integrity checking
//! - [`types`]: Common types and data structures
//! - [`error`]: Error types and handling

// Public API modules
pub mod commit;
pub mod diff;
pub mod error;
pub mod head;
pub mod history;
pub mod index;
pub mod repository;
pub mod storage;
pub mod types;
pub mod utils;
pub mod verification;

// Re-export main types for convenience
pub use commit::Commit;
pub use diff::{diff_lines, DiffKind, DiffOptions, DiffPart, DiffStats};
pub use error::{Result, VerxError};
pub use history::History;
pub use repository::{Repository, RepositoryBuilder};
pub use storage::ObjectStore;
pub use types::*;
pub use verification::{RepositoryVerifier, VerificationReport};
