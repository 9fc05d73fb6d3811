//! Main test module for verx
//!
//! This module includes all test suites:
//! - Integration tests for complete workflows
//! - Property-based tests for invariants
//! - Edge cases around paths, content and configuration

pub mod integration;
pub mod property;

#[cfg(test)]
mod edge_cases {
    use ::verx::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_empty_repository() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();

        assert_eq!(repo.current_head(), None);
        assert!(repo.log(None).unwrap().is_empty());
        assert!(repo.staged().unwrap().is_empty());
        assert_eq!(repo.stats().unwrap().object_count, 0);

        let report = repo.verify().unwrap();
        assert!(report.is_valid());
        assert_eq!(report.commits_checked, 0);
    }

    #[test]
    fn test_empty_and_identical_files() {
        let temp_dir = TempDir::new().unwrap();
        let mut repo = Repository::init(temp_dir.path()).unwrap();

        fs::write(temp_dir.path().join("empty.txt"), "").unwrap();
        fs::write(temp_dir.path().join("same1.txt"), "same").unwrap();
        fs::write(temp_dir.path().join("same2.txt"), "same").unwrap();
        let empty = repo.add("empty.txt").unwrap();
        let same1 = repo.add("same1.txt").unwrap();
        let same2 = repo.add("same2.txt").unwrap();
        assert_eq!(same1.hash, same2.hash);

        repo.commit("edge contents").unwrap();
        assert_eq!(repo.cat_object(&empty.hash).unwrap(), b"");

        // Two blobs (empty and "same") plus one commit
        assert_eq!(repo.stats().unwrap().object_count, 3);
    }

    #[test]
    fn test_special_filenames() {
        let temp_dir = TempDir::new().unwrap();
        let mut repo = Repository::init(temp_dir.path()).unwrap();

        let special_names = vec![
            "file with spaces.txt",
            "file-with-dashes.txt",
            "file.with.dots.txt",
            "file@with#special$chars.txt",
            "file(with)parens.txt",
            "файл.txt",
            "文件.txt",
        ];

        let mut added = Vec::new();
        for name in &special_names {
            let path = temp_dir.path().join(name);
            if fs::write(&path, format!("Content of {}", name)).is_err() {
                // Skip if OS doesn't support this filename
                continue;
            }
            repo.add(name).unwrap();
            added.push(*name);
        }

        let digest = repo.commit("Special names").unwrap();
        let commit = repo.resolve_commit(&digest).unwrap();
        for name in &added {
            let entry = commit.find_file(name).unwrap();
            assert_eq!(
                repo.cat_object(&entry.hash).unwrap(),
                format!("Content of {}", name).into_bytes()
            );
        }
    }

    #[test]
    fn test_nested_paths_use_forward_slashes() {
        let temp_dir = TempDir::new().unwrap();
        let mut repo = Repository::init(temp_dir.path()).unwrap();

        let nested = temp_dir.path().join("a").join("b");
        fs::create_dir_all(&nested).unwrap();
        fs::write(nested.join("c.txt"), "deep").unwrap();

        let entry = repo.add(std::path::Path::new("a").join("b").join("c.txt")).unwrap();
        assert_eq!(entry.path, "a/b/c.txt");
    }

    #[test]
    fn test_add_directory_fails() {
        let temp_dir = TempDir::new().unwrap();
        let mut repo = Repository::init(temp_dir.path()).unwrap();
        fs::create_dir_all(temp_dir.path().join("dir")).unwrap();

        assert!(repo.add("dir").is_err());
        assert!(repo.staged().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_digest() {
        let temp_dir = TempDir::new().unwrap();
        let repo = Repository::init(temp_dir.path()).unwrap();

        let unknown = utils::hash_data(b"never stored");
        assert!(repo.resolve_commit(&unknown).unwrap_err().is_not_found());
        assert!(matches!(repo.resolve("zz"), Err(VerxError::InvalidDigest(_))));
        assert!(matches!(repo.resolve("abcdef"), Err(VerxError::ObjectNotFound(_))));
    }

    #[test]
    fn test_corrupt_config_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        Repository::init(temp_dir.path()).unwrap();
        fs::write(
            temp_dir.path().join(repository::REPO_DIR_NAME).join("config.json"),
            "{ broken",
        )
        .unwrap();

        assert!(matches!(
            Repository::open(temp_dir.path()),
            Err(VerxError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_missing_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        Repository::init(temp_dir.path()).unwrap();
        fs::remove_file(temp_dir.path().join(repository::REPO_DIR_NAME).join("config.json")).unwrap();

        let repo = Repository::open(temp_dir.path()).unwrap();
        assert_eq!(repo.config(), &RepositoryConfig::default());
    }
}

// Re-export test utilities for use in other suites
pub use integration::{ContentGenerator, RepoTestHarness};
