//! Integration tests for verx
//!
//! Exercises full add / commit / log / show cycles against real
//! repository directories, including reopening and crash recovery.

use ::verx::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Test harness owning a worktree and the repository inside it
pub struct RepoTestHarness {
    pub temp_dir: TempDir,
    pub repo: Repository,
    pub content_generator: ContentGenerator,
}

impl RepoTestHarness {
    /// Create a harness with a freshly initialized repository
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let repo = RepositoryBuilder::new().build(temp_dir.path()).unwrap();

        Self {
            temp_dir,
            repo,
            content_generator: ContentGenerator::new(42),
        }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Write `content` to `name` and stage it
    pub fn write_and_add(&mut self, name: &str, content: &str) -> anyhow::Result<StagingEntry> {
        let path = self.temp_dir.path().join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(self.repo.add(name)?)
    }

    /// Drop the current handle and open the repository again
    pub fn reopen(&mut self) -> anyhow::Result<()> {
        self.repo = Repository::open(self.temp_dir.path())?;
        Ok(())
    }
}

impl Default for RepoTestHarness {
    fn default() -> Self {
        Self::new()
    }
}

/// Deterministic generator for multi-line text content
pub struct ContentGenerator {
    pub rng: StdRng,
}

impl ContentGenerator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Generate `lines` lines drawn from a small vocabulary so edits overlap
    pub fn generate_text(&mut self, lines: usize) -> String {
        const WORDS: &[&str] = &["alpha", "beta", "gamma", "delta", "epsilon", "zeta"];
        (0..lines)
            .map(|_| {
                let a = WORDS[self.rng.random_range(0..WORDS.len())];
                let b = WORDS[self.rng.random_range(0..WORDS.len())];
                format!("{} {}", a, b)
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    #[test]
    fn test_history_order() {
        let mut harness = RepoTestHarness::new();

        let mut digests = Vec::new();
        for name in ["C1", "C2", "C3"] {
            harness.write_and_add("file.txt", name).unwrap();
            digests.push(harness.repo.commit(name).unwrap());
        }

        let walked: Vec<(Digest, Commit)> = harness.repo.log(None).unwrap();
        let messages: Vec<&str> = walked.iter().map(|(_, c)| c.message.as_str()).collect();
        assert_eq!(messages, vec!["C3", "C2", "C1"]);

        let walked_digests: Vec<Digest> = walked.iter().map(|(d, _)| d.clone()).collect();
        digests.reverse();
        assert_eq!(walked_digests, digests);
    }

    #[test]
    fn test_content_round_trip() {
        let mut harness = RepoTestHarness::new();
        harness.write_and_add("f", "hello").unwrap();
        let digest = harness.repo.commit("store hello").unwrap();

        let commit = harness.repo.resolve_commit(&digest).unwrap();
        let entry = commit.find_file("f").unwrap();
        assert_eq!(harness.repo.cat_object(&entry.hash).unwrap(), b"hello");
    }

    #[test]
    fn test_commit_always_clears_index() {
        let mut harness = RepoTestHarness::new();
        harness.write_and_add("a.txt", "a").unwrap();
        harness.write_and_add("b.txt", "b").unwrap();
        assert_eq!(harness.repo.staged().unwrap().len(), 2);

        harness.repo.commit("two files").unwrap();
        assert!(harness.repo.staged().unwrap().is_empty());

        // Still empty for a fresh handle
        harness.reopen().unwrap();
        assert!(harness.repo.staged().unwrap().is_empty());
    }

    #[test]
    fn test_staging_survives_reopen() {
        let mut harness = RepoTestHarness::new();
        harness.write_and_add("notes.md", "draft").unwrap();

        harness.reopen().unwrap();
        let staged = harness.repo.staged().unwrap();
        assert_eq!(staged.len(), 1);
        assert_eq!(staged[0].path, "notes.md");
    }

    #[test]
    fn test_new_file_detection() {
        let mut harness = RepoTestHarness::new();
        harness.write_and_add("old.txt", "old").unwrap();
        harness.repo.commit("first").unwrap();

        harness.write_and_add("fresh.txt", "fresh").unwrap();
        let second = harness.repo.commit("second").unwrap();

        let diff = harness.repo.show_commit_diff(&second).unwrap();
        assert_eq!(diff.files.len(), 1);
        assert_eq!(diff.files[0].path, "fresh.txt");
        assert_eq!(diff.files[0].change, FileChange::New);
    }

    #[test]
    fn test_duplicate_paths_use_first_match() {
        let mut harness = RepoTestHarness::new();

        // The parent commit records f.txt twice: "v1" first, then "v2"
        harness.write_and_add("f.txt", "v1").unwrap();
        harness.write_and_add("f.txt", "v2").unwrap();
        let parent = harness.repo.commit("duplicates").unwrap();
        assert_eq!(harness.repo.resolve_commit(&parent).unwrap().files.len(), 2);

        harness.write_and_add("f.txt", "v3").unwrap();
        let child = harness.repo.commit("after duplicates").unwrap();

        let diff = harness.repo.show_commit_diff(&child).unwrap();
        match &diff.files[0].change {
            FileChange::Modified { parts, .. } => {
                let removed: Vec<String> = parts
                    .iter()
                    .filter(|p| p.kind == DiffKind::Removed)
                    .flat_map(|p| p.lines.clone())
                    .collect();
                assert_eq!(removed, vec!["v1"]);
            }
            other => panic!("expected a modification, got {:?}", other),
        }
    }

    #[test]
    fn test_commit_digest_matches_put() {
        let mut harness = RepoTestHarness::new();
        harness.write_and_add("a.txt", "a").unwrap();
        let digest = harness.repo.commit("first").unwrap();

        let commit = harness.repo.resolve_commit(&digest).unwrap();
        let bytes = commit.to_canonical_bytes().unwrap();
        assert_eq!(harness.repo.store().put(&bytes).unwrap(), digest);
        assert_eq!(harness.repo.cat_object(&digest).unwrap(), bytes);
    }

    #[test]
    fn test_parent_chain_reaches_root() {
        let mut harness = RepoTestHarness::new();
        for i in 0..10 {
            let text = harness.content_generator.generate_text(5 + i);
            harness.write_and_add("doc.txt", &text).unwrap();
            harness.repo.commit(&format!("revision {}", i)).unwrap();
        }

        let log = harness.repo.log(None).unwrap();
        assert_eq!(log.len(), 10);
        for window in log.windows(2) {
            assert_eq!(window[0].1.parent.as_ref(), Some(&window[1].0));
        }
        assert!(log.last().unwrap().1.is_root());
        assert!(harness.repo.verify().unwrap().is_valid());
    }

    #[test]
    fn test_diff_parts_rebuild_both_sides() {
        let mut harness = RepoTestHarness::new();
        let old_text = harness.content_generator.generate_text(30);
        let new_text = harness.content_generator.generate_text(30);

        harness.write_and_add("doc.txt", &old_text).unwrap();
        harness.repo.commit("old").unwrap();
        harness.write_and_add("doc.txt", &new_text).unwrap();
        let digest = harness.repo.commit("new").unwrap();

        let diff = harness.repo.show_commit_diff(&digest).unwrap();
        let FileChange::Modified { parts, .. } = &diff.files[0].change else {
            panic!("doc.txt should be modified");
        };

        let old_side: Vec<&str> = parts
            .iter()
            .filter(|p| p.kind != DiffKind::Added)
            .flat_map(|p| p.lines.iter().map(String::as_str))
            .collect();
        let new_side: Vec<&str> = parts
            .iter()
            .filter(|p| p.kind != DiffKind::Removed)
            .flat_map(|p| p.lines.iter().map(String::as_str))
            .collect();
        assert_eq!(old_side, old_text.lines().collect::<Vec<_>>());
        assert_eq!(new_side, new_text.lines().collect::<Vec<_>>());
    }

    #[test]
    fn test_dangling_parent_fails_fast() {
        let mut harness = RepoTestHarness::new();
        harness.write_and_add("a.txt", "a").unwrap();
        let first = harness.repo.commit("first").unwrap();
        harness.write_and_add("a.txt", "b").unwrap();
        let second = harness.repo.commit("second").unwrap();

        fs::remove_file(
            harness
                .root()
                .join(repository::REPO_DIR_NAME)
                .join("objects")
                .join(first.as_str()),
        )
        .unwrap();

        let err = harness.repo.log(None).unwrap_err();
        assert!(matches!(err, VerxError::CorruptRecord { .. }));

        let err = harness.repo.show_commit_diff(&second).unwrap_err();
        assert!(err.is_corruption());
        assert!(!harness.repo.verify().unwrap().is_valid());
    }

    #[test]
    fn test_tampered_object_is_detected() {
        let mut harness = RepoTestHarness::new();
        let entry = harness.write_and_add("a.txt", "original").unwrap();
        harness.repo.commit("first").unwrap();

        let object_path = harness
            .root()
            .join(repository::REPO_DIR_NAME)
            .join("objects")
            .join(entry.hash.as_str());
        fs::write(&object_path, "tampered").unwrap();

        assert!(matches!(
            harness.repo.cat_object(&entry.hash),
            Err(VerxError::HashMismatch { .. })
        ));
        assert!(!harness.repo.verify().unwrap().is_valid());
    }

    #[test]
    #[traced_test]
    fn test_garbage_head_reads_as_empty() {
        let mut harness = RepoTestHarness::new();
        fs::write(
            harness.root().join(repository::REPO_DIR_NAME).join("HEAD"),
            "definitely not a digest",
        )
        .unwrap();

        harness.reopen().unwrap();
        assert_eq!(harness.repo.current_head(), None);
        assert!(harness.repo.log(None).unwrap().is_empty());

        // The next commit starts a fresh root
        harness.write_and_add("a.txt", "a").unwrap();
        let digest = harness.repo.commit("restart").unwrap();
        assert!(harness.repo.resolve_commit(&digest).unwrap().is_root());
    }
}
