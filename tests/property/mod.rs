//! Property-based testing for verx
//!
//! Uses proptest to check store, commit and diff invariants across
//! randomly generated inputs.

use ::verx::*;
use proptest::prelude::*;
use tempfile::TempDir;

/// Generate multi-line text from a small alphabet so lines repeat
fn text_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[abc]{0,2}", 0..20).prop_map(|lines| lines.join("\n"))
}

/// Generate arbitrary file content
fn content_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..2048)
}

fn create_store() -> (ObjectStore, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let store = ObjectStore::init(temp_dir.path().join("objects"), true).unwrap();
    (store, temp_dir)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// get(put(c)) == c, and putting twice stores one object
    #[test]
    fn prop_store_round_trip(content in content_strategy()) {
        let (store, _temp_dir) = create_store();

        let first = store.put(&content).unwrap();
        let second = store.put(&content).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(store.get(&first).unwrap(), content);
        prop_assert_eq!(store.list().unwrap().len(), 1);
    }

    /// Distinct content never shares a digest
    #[test]
    fn prop_distinct_content_distinct_digests(a in content_strategy(), b in content_strategy()) {
        prop_assume!(a != b);
        prop_assert_ne!(utils::hash_data(&a), utils::hash_data(&b));
    }

    /// Same inputs, same parts
    #[test]
    fn prop_diff_is_deterministic(old in text_strategy(), new in text_strategy()) {
        prop_assert_eq!(diff_lines(&old, &new), diff_lines(&old, &new));
    }

    /// Dropping added lines rebuilds the old text, dropping removed lines the new one
    #[test]
    fn prop_diff_rebuilds_both_sides(old in text_strategy(), new in text_strategy()) {
        let parts = diff_lines(&old, &new);

        let old_side: Vec<String> = parts
            .iter()
            .filter(|p| p.kind != DiffKind::Added)
            .flat_map(|p| p.lines.clone())
            .collect();
        let new_side: Vec<String> = parts
            .iter()
            .filter(|p| p.kind != DiffKind::Removed)
            .flat_map(|p| p.lines.clone())
            .collect();

        prop_assert_eq!(old_side, old.lines().map(String::from).collect::<Vec<_>>());
        prop_assert_eq!(new_side, new.lines().map(String::from).collect::<Vec<_>>());
    }

    /// Parts are coalesced and never empty
    #[test]
    fn prop_diff_parts_are_maximal(old in text_strategy(), new in text_strategy()) {
        let parts = diff_lines(&old, &new);
        prop_assert!(parts.iter().all(|p| !p.lines.is_empty()));
        prop_assert!(parts.windows(2).all(|w| w[0].kind != w[1].kind));
    }

    /// Unchanged lines form a longest common subsequence: diffing a text
    /// against itself changes nothing
    #[test]
    fn prop_self_diff_has_no_changes(text in text_strategy()) {
        let parts = diff_lines(&text, &text);
        prop_assert!(!DiffStats::from_parts(&parts).has_changes());
    }

    /// A stored commit decodes to itself and its digest matches put()
    #[test]
    fn prop_commit_encoding_is_stable(
        message in ".{0,40}",
        paths in prop::collection::vec("[a-z]{1,8}(/[a-z]{1,8}){0,2}", 0..6),
    ) {
        let (store, _temp_dir) = create_store();
        let files: Vec<StagingEntry> = paths
            .iter()
            .map(|p| StagingEntry::new(p.clone(), utils::hash_data(p.as_bytes())))
            .collect();
        let commit = Commit::new(message, files, None);

        let digest = store.store_commit(&commit).unwrap();
        prop_assert_eq!(store.load_commit(&digest).unwrap(), commit.clone());
        prop_assert_eq!(store.put(&commit.to_canonical_bytes().unwrap()).unwrap(), digest);
    }
}
