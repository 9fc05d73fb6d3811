//! The repository handle
//!
//! This module provides [`Repository`], the entry point for every
//! operation: staging files, creating commits, walking history and showing
//! what a commit changed.
//!
//! ## Overview
//!
//! A repository is a `.verx` directory inside a worktree. The handle owns
//! one of each of its parts and nothing is shared between handles:
//!
//! - **Object Store**: content-addressed blobs and commit records
//! - **Staging Index**: the ordered list of entries for the next commit
//! - **HEAD**: the digest of the newest commit
//! - **Configuration**: `config.json`, see [`RepositoryConfig`]
//!
//! ## Commit Durability
//!
//! Creating a commit touches three resources (object, HEAD, index) that
//! cannot be updated atomically together. The commit digest is journaled
//! to `COMMIT_PENDING` first and the journal is removed last. When a
//! repository is opened with a journal left behind, the interrupted commit
//! is finished if its object was written and still extends HEAD, and
//! dropped otherwise.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use verx::Repository;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut repo = Repository::init("./my_project")?;
//!
//! repo.add("README.md")?;
//! let digest = repo.commit("Initial commit")?;
//!
//! for entry in repo.history() {
//!     let (digest, commit) = entry?;
//!     println!("{} {}", digest.short(), commit.summary());
//! }
//!
//! let diff = repo.show_commit_diff(&digest)?;
//! assert!(diff.is_initial());
//! # Ok(())
//! # }
//! ```

use crate::commit::Commit;
use crate::diff::{self, DiffOptions, DiffStats};
use crate::error::{Result, VerxError};
use crate::head::Head;
use crate::history::History;
use crate::index::StagingIndex;
use crate::storage::ObjectStore;
use crate::types::*;
use crate::utils;
use crate::verification::{RepositoryVerifier, VerificationReport};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, warn};

/// Name of the repository directory inside a worktree
pub const REPO_DIR_NAME: &str = ".verx";

const OBJECTS_DIR: &str = "objects";
const HEAD_FILE: &str = "HEAD";
const INDEX_FILE: &str = "index";
const CONFIG_FILE: &str = "config.json";
const PENDING_FILE: &str = "COMMIT_PENDING";

/// Handle to an open repository
///
/// Constructed once per session with [`Repository::init`],
/// [`Repository::open`] or [`RepositoryBuilder`]. Every operation reads and
/// writes through the handle; there is no process-wide state.
///
/// The handle assumes exclusive access. Two processes mutating the same
/// repository can lose staged entries or HEAD updates.
#[derive(Debug)]
pub struct Repository {
    /// Directory whose files are staged
    worktree: PathBuf,
    /// `<worktree>/.verx`
    repo_dir: PathBuf,
    store: ObjectStore,
    index: StagingIndex,
    head: Head,
    metadata: RepositoryMetadata,
}

impl Repository {
    /// Initialize a repository in `worktree` with default configuration
    ///
    /// # Errors
    ///
    /// - [`VerxError::AlreadyInitialized`] if the worktree already has a
    ///   complete repository. Callers usually treat this as informational
    ///   and [`open`](Repository::open) instead.
    /// - [`VerxError::PathNotFound`] if `worktree` is not a directory
    pub fn init(worktree: impl AsRef<Path>) -> Result<Self> {
        Self::init_with_config(worktree, RepositoryConfig::default())
    }

    /// Initialize a repository with explicit configuration
    ///
    /// Partially created scaffolding (for example from an interrupted
    /// `init`) is completed rather than rejected. An existing
    /// `config.json` is kept.
    #[instrument(skip_all, fields(worktree = ?worktree.as_ref()))]
    pub fn init_with_config(worktree: impl AsRef<Path>, config: RepositoryConfig) -> Result<Self> {
        let worktree = worktree.as_ref().to_path_buf();
        if !worktree.is_dir() {
            return Err(VerxError::PathNotFound(worktree));
        }

        let repo_dir = worktree.join(REPO_DIR_NAME);
        if Self::is_initialized(&worktree) {
            return Err(VerxError::AlreadyInitialized(repo_dir));
        }

        fs::create_dir_all(&repo_dir)?;
        let store = ObjectStore::init(repo_dir.join(OBJECTS_DIR), config.verify_on_read)?;
        let (head, head_created) = Head::init(repo_dir.join(HEAD_FILE))?;
        let (index, index_created) = StagingIndex::init(repo_dir.join(INDEX_FILE))?;
        debug!("HEAD created: {}, index created: {}", head_created, index_created);

        let config_path = repo_dir.join(CONFIG_FILE);
        let metadata = if config_path.exists() {
            load_metadata(&config_path)?
        } else {
            let metadata = RepositoryMetadata::new(config);
            save_metadata(&config_path, &metadata)?;
            metadata
        };

        info!("Initialized verx repository at {:?}", repo_dir);
        Ok(Self {
            worktree,
            repo_dir,
            store,
            index,
            head,
            metadata,
        })
    }

    /// Open the repository in `worktree`
    ///
    /// Loads `config.json` (defaults apply when it is absent) and finishes or
    /// discards a commit that was interrupted by a crash.
    ///
    /// # Errors
    ///
    /// - [`VerxError::NotInitialized`] if the repository directory or any of
    ///   objects, HEAD or index is missing
    /// - [`VerxError::InvalidConfiguration`] if `config.json` cannot be parsed
    #[instrument(skip_all, fields(worktree = ?worktree.as_ref()))]
    pub fn open(worktree: impl AsRef<Path>) -> Result<Self> {
        let worktree = worktree.as_ref().to_path_buf();
        let repo_dir = worktree.join(REPO_DIR_NAME);
        if !repo_dir.is_dir() {
            return Err(VerxError::NotInitialized {
                root: repo_dir,
                missing: REPO_DIR_NAME,
            });
        }

        let config_path = repo_dir.join(CONFIG_FILE);
        let metadata = if config_path.exists() {
            load_metadata(&config_path)?
        } else {
            debug!("No {} found, using default configuration", CONFIG_FILE);
            RepositoryMetadata::new(RepositoryConfig::default())
        };

        let store = ObjectStore::open(repo_dir.join(OBJECTS_DIR), metadata.config.verify_on_read)?;
        let head = Head::open(repo_dir.join(HEAD_FILE))?;
        let index = StagingIndex::open(repo_dir.join(INDEX_FILE))?;

        let repo = Self {
            worktree,
            repo_dir,
            store,
            index,
            head,
            metadata,
        };
        repo.recover_pending_commit()?;

        info!("Opened verx repository at {:?}", repo.repo_dir);
        Ok(repo)
    }

    /// Whether `worktree` holds a complete repository
    pub fn is_initialized(worktree: impl AsRef<Path>) -> bool {
        let repo_dir = worktree.as_ref().join(REPO_DIR_NAME);
        repo_dir.join(OBJECTS_DIR).is_dir()
            && repo_dir.join(HEAD_FILE).is_file()
            && repo_dir.join(INDEX_FILE).is_file()
    }

    /// Stage a file for the next commit
    ///
    /// Relative paths are resolved against the worktree and `.`/`..`
    /// components are folded away. The file content is stored immediately;
    /// the recorded path is worktree-relative with `/` separators when the
    /// file lives inside the worktree, and the normalized path as given
    /// otherwise.
    ///
    /// # Errors
    ///
    /// - [`VerxError::PathNotFound`] if the file does not exist
    #[instrument(skip_all, fields(path = ?path.as_ref()))]
    pub fn add(&mut self, path: impl AsRef<Path>) -> Result<StagingEntry> {
        let path = path.as_ref();
        let source = if path.is_absolute() {
            utils::normalize_path(path)
        } else {
            utils::normalize_path(&self.worktree.join(path))
        };

        let content = utils::read_source_file(&source)?;
        let digest = self.store.put(&content)?;

        let worktree = utils::normalize_path(&self.worktree);
        let entry_path = match utils::make_relative(&source, &worktree) {
            Ok(relative) => utils::path_to_entry(&relative),
            Err(_) => utils::path_to_entry(&utils::normalize_path(path)),
        };

        let entry = self.index.stage(entry_path, digest)?;
        debug!("Added {} ({} bytes)", entry.path, content.len());
        Ok(entry)
    }

    /// Commit everything currently staged
    ///
    /// Returns the digest of the new commit.
    ///
    /// # Errors
    ///
    /// - [`VerxError::EmptyIndex`] if nothing is staged and empty commits
    ///   are not allowed by the configuration
    #[instrument(skip(self))]
    pub fn commit(&mut self, message: &str) -> Result<Digest> {
        let files = self.index.snapshot()?;
        self.create_commit(message, files)
    }

    /// Create a commit from an explicit file list
    ///
    /// The parent is the current HEAD. The record is hashed once, stored
    /// under that digest, HEAD moves to it and the staging index is
    /// cleared. A failure part way leaves the completed steps in place; the
    /// commit journal lets the next [`open`](Repository::open) finish or
    /// discard it.
    #[instrument(skip(self, files), fields(files = files.len()))]
    pub fn create_commit(&mut self, message: &str, files: Vec<StagingEntry>) -> Result<Digest> {
        if files.is_empty() && !self.metadata.config.allow_empty_commits {
            return Err(VerxError::EmptyIndex);
        }

        let parent = self.head.read();
        let commit = Commit::new(message, files, parent);
        let (digest, bytes) = commit.encode()?;

        let pending_path = self.pending_path();
        utils::atomic_write(&pending_path, digest.as_str().as_bytes())?;

        self.store.write_at(&digest, &bytes)?;
        self.head.set(&digest)?;
        self.index.clear()?;

        fs::remove_file(&pending_path)?;

        info!(
            "Created commit {} with {} files",
            digest.short(),
            commit.files.len()
        );
        Ok(digest)
    }

    /// Digest of the newest commit, `None` before the first commit
    pub fn current_head(&self) -> Option<Digest> {
        self.head.read()
    }

    /// Load a commit by digest
    ///
    /// # Errors
    ///
    /// - [`VerxError::ObjectNotFound`] if no object has this digest
    /// - [`VerxError::CorruptRecord`] if the object is not a commit
    pub fn resolve_commit(&self, digest: &Digest) -> Result<Commit> {
        self.store.load_commit(digest)
    }

    /// Resolve a full or abbreviated digest
    pub fn resolve(&self, digest_or_prefix: &str) -> Result<Digest> {
        self.store.resolve_prefix(digest_or_prefix)
    }

    /// Lazy walk from HEAD to the root commit
    pub fn history(&self) -> History<'_> {
        History::new(&self.store, self.head.read())
    }

    /// Collect up to `limit` commits from HEAD, newest first
    ///
    /// Fails on the first link that cannot be resolved.
    #[instrument(skip(self))]
    pub fn log(&self, limit: Option<usize>) -> Result<Vec<(Digest, Commit)>> {
        self.history()
            .take(limit.unwrap_or(usize::MAX))
            .collect()
    }

    /// Compare a commit with its parent
    pub fn show_commit_diff(&self, digest: &Digest) -> Result<CommitDiff> {
        self.show_commit_diff_with(digest, &DiffOptions::default())
    }

    /// Compare a commit with its parent using explicit diff options
    ///
    /// Every file recorded in the commit is reported in order. Without a
    /// parent each file is [`FileChange::Initial`]. Otherwise the first
    /// entry with the same path in the parent is the base: absent means
    /// [`FileChange::New`], binary content on either side means
    /// [`FileChange::Binary`], and anything else is line-diffed.
    #[instrument(skip(self, options))]
    pub fn show_commit_diff_with(&self, digest: &Digest, options: &DiffOptions) -> Result<CommitDiff> {
        let commit = self.resolve_commit(digest)?;
        let parent = match &commit.parent {
            Some(parent_digest) => Some(self.resolve_commit(parent_digest).map_err(|e| match e {
                VerxError::ObjectNotFound(missing) => {
                    VerxError::corrupt(missing, format!("parent of {} is missing", digest.short()))
                }
                other => other,
            })?),
            None => None,
        };

        let mut files = Vec::with_capacity(commit.files.len());
        for entry in &commit.files {
            let content = self.store.get(&entry.hash)?;

            let change = match parent.as_ref() {
                None => FileChange::Initial,
                Some(parent) => match parent.find_file(&entry.path) {
                    None => FileChange::New,
                    Some(base) => {
                        let base_content = self.store.get(&base.hash)?;
                        if diff::is_binary_content(&base_content) || diff::is_binary_content(&content) {
                            FileChange::Binary
                        } else {
                            let parts = diff::diff_lines_with(
                                &String::from_utf8_lossy(&base_content),
                                &String::from_utf8_lossy(&content),
                                options,
                            );
                            let stats = DiffStats::from_parts(&parts);
                            FileChange::Modified { parts, stats }
                        }
                    }
                },
            };

            files.push(FileDiff {
                path: entry.path.clone(),
                hash: entry.hash.clone(),
                content: String::from_utf8_lossy(&content).into_owned(),
                change,
            });
        }

        debug!("Diffed commit {} ({} files)", digest.short(), files.len());
        Ok(CommitDiff {
            digest: digest.clone(),
            commit,
            files,
        })
    }

    /// Entries staged for the next commit
    pub fn staged(&self) -> Result<Vec<StagingEntry>> {
        self.index.snapshot()
    }

    /// Raw bytes of any stored object
    pub fn cat_object(&self, digest: &Digest) -> Result<Vec<u8>> {
        self.store.get(digest)
    }

    /// Check every commit and blob reachable from HEAD
    #[instrument(skip(self))]
    pub fn verify(&self) -> Result<VerificationReport> {
        RepositoryVerifier::new(&self.store).verify_history(self.head.read().as_ref())
    }

    /// Object store statistics
    pub fn stats(&self) -> Result<StorageStats> {
        self.store.stats()
    }

    /// The worktree this repository tracks
    pub fn worktree(&self) -> &Path {
        &self.worktree
    }

    /// The `.verx` directory
    pub fn repo_dir(&self) -> &Path {
        &self.repo_dir
    }

    /// Active configuration
    pub fn config(&self) -> &RepositoryConfig {
        &self.metadata.config
    }

    /// Repository metadata
    pub fn metadata(&self) -> &RepositoryMetadata {
        &self.metadata
    }

    /// The underlying object store
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    fn pending_path(&self) -> PathBuf {
        self.repo_dir.join(PENDING_FILE)
    }

    /// Finish or discard a commit interrupted by a crash
    ///
    /// Returns the digest HEAD was moved to when the commit was completed.
    fn recover_pending_commit(&self) -> Result<Option<Digest>> {
        let pending_path = self.pending_path();
        let raw = match fs::read_to_string(&pending_path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let recovered = match Digest::parse(&raw) {
            Ok(digest) => self.complete_pending_commit(digest)?,
            Err(_) => {
                warn!("Discarding unreadable commit journal {:?}", raw.trim());
                None
            }
        };

        fs::remove_file(&pending_path)?;
        Ok(recovered)
    }

    fn complete_pending_commit(&self, digest: Digest) -> Result<Option<Digest>> {
        let commit = match self.store.load_commit(&digest) {
            Ok(commit) => commit,
            Err(e) => {
                warn!("Discarding interrupted commit {}: {}", digest.short(), e);
                return Ok(None);
            }
        };

        let head = self.head.read();
        if head.as_ref() == Some(&digest) {
            self.index.clear()?;
        } else if commit.parent == head {
            self.head.set(&digest)?;
            self.index.clear()?;
        } else {
            warn!(
                "Discarding interrupted commit {}: it no longer extends HEAD",
                digest.short()
            );
            return Ok(None);
        }

        info!("Completed interrupted commit {}", digest.short());
        Ok(Some(digest))
    }
}

fn load_metadata(path: &Path) -> Result<RepositoryMetadata> {
    let data = fs::read(path)?;
    let metadata: RepositoryMetadata = serde_json::from_slice(&data).map_err(|e| {
        VerxError::InvalidConfiguration(format!("{}: {}", path.display(), e))
    })?;

    if metadata.format_version != REPOSITORY_FORMAT_VERSION {
        return Err(VerxError::InvalidConfiguration(format!(
            "{}: unsupported repository format version {} (expected {})",
            path.display(),
            metadata.format_version,
            REPOSITORY_FORMAT_VERSION
        )));
    }
    Ok(metadata)
}

fn save_metadata(path: &Path, metadata: &RepositoryMetadata) -> Result<()> {
    let json = serde_json::to_vec_pretty(metadata)?;
    utils::atomic_write(path, &json)
}

/// Builder for opening or creating a repository with custom settings
///
/// Settings only apply when the repository is created. An existing
/// repository keeps the configuration stored in its `config.json`.
///
/// # Examples
///
/// ```rust,no_run
/// use verx::RepositoryBuilder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let repo = RepositoryBuilder::new()
///     .allow_empty_commits(true)
///     .build("./my_project")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct RepositoryBuilder {
    config: RepositoryConfig,
}

impl RepositoryBuilder {
    /// Create a new builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Allow commits with nothing staged
    pub fn allow_empty_commits(mut self, allow: bool) -> Self {
        self.config.allow_empty_commits = allow;
        self
    }

    /// Re-hash objects on every read
    pub fn verify_on_read(mut self, verify: bool) -> Self {
        self.config.verify_on_read = verify;
        self
    }

    /// Open the repository in `worktree`, creating it if needed
    pub fn build(self, worktree: impl AsRef<Path>) -> Result<Repository> {
        if Repository::is_initialized(&worktree) {
            Repository::open(worktree)
        } else {
            Repository::init_with_config(worktree, self.config)
        }
    }
}
