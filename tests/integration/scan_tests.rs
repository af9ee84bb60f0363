use super::common::{find, pattern, write, PROFILES};
use dupsweep::duplicates::{DuplicateFinder, FinderConfig, FinderError};
use dupsweep::scanner::{SamplingHasher, SamplingPolicy};
use dupsweep::storage::StorageProfile;
use std::fs;
use tempfile::tempdir;

const LEN: usize = 4 * 1024 * 1024;

/// First byte offset that no sampled range covers.
fn unsampled_offset(policy: SamplingPolicy, len: u64) -> u64 {
    let mut cursor = 0;
    for (offset, length) in policy.sample_ranges(len) {
        if offset > cursor {
            return cursor;
        }
        cursor = cursor.max(offset + length);
    }
    assert!(cursor < len, "policy covers the whole file");
    cursor
}

#[test]
fn test_sample_collision_is_caught_by_full_digest() {
    for profile in PROFILES {
        let policy = SamplingPolicy::for_profile(profile);
        let dir = tempdir().unwrap();
        let original = pattern(LEN, 3);
        let mut altered = original.clone();
        let offset = unsampled_offset(policy, LEN as u64) as usize;
        altered[offset] ^= 0xFF;

        let a = write(dir.path(), "a.bin", &original);
        let b = write(dir.path(), "b.bin", &altered);
        write(dir.path(), "c.bin", &original);

        let hasher = SamplingHasher::new(policy);
        assert_eq!(hasher.digest(&a).unwrap(), hasher.digest(&b).unwrap());

        let (sets, summary) = find(dir.path(), profile, 2);
        assert_eq!(sets.len(), 1, "{profile}");
        let names: Vec<_> = sets[0]
            .paths()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.bin", "c.bin"]);
        assert_eq!(summary.duplicate_files, 1);
        assert!(b.exists());
    }
}

#[test]
fn test_empty_files_never_form_sets() {
    for profile in PROFILES {
        let dir = tempdir().unwrap();
        for name in ["e1", "e2", "sub/e3"] {
            write(dir.path(), name, b"");
        }
        write(dir.path(), "x.txt", b"payload");
        write(dir.path(), "sub/y.txt", b"payload");

        let (sets, summary) = find(dir.path(), profile, 3);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].size(), 7);
        assert_eq!(summary.total_files, 2);
    }
}

#[test]
fn test_distinct_sizes_are_never_compared() {
    let dir = tempdir().unwrap();
    for len in 1..=20 {
        write(dir.path(), &format!("f{len}"), &pattern(len, 0));
    }

    let (sets, summary) = find(dir.path(), StorageProfile::SolidState, 4);
    assert!(sets.is_empty());
    assert_eq!(summary.eliminated_by_size, 20);
}

#[test]
fn test_non_recursive_scan_ignores_subdirectories() {
    let dir = tempdir().unwrap();
    write(dir.path(), "top.bin", b"same bytes");
    write(dir.path(), "nested/inner.bin", b"same bytes");

    let config = FinderConfig::default()
        .with_profile(StorageProfile::Rotating)
        .with_recursive(false);
    let (sets, summary) = DuplicateFinder::new(config)
        .find_duplicates(dir.path())
        .unwrap();

    assert!(sets.is_empty());
    assert_eq!(summary.total_files, 1);
}

#[test]
fn test_missing_root_is_fatal() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("nope");

    let err = DuplicateFinder::with_defaults()
        .find_duplicates(&missing)
        .unwrap_err();
    assert!(matches!(err, FinderError::PathNotFound(_)));
}

#[test]
fn test_file_root_is_fatal() {
    let dir = tempdir().unwrap();
    let file = write(dir.path(), "plain.txt", b"x");

    let err = DuplicateFinder::with_defaults()
        .find_duplicates(&file)
        .unwrap_err();
    assert!(matches!(err, FinderError::NotADirectory(_)));
}

#[cfg(unix)]
#[test]
fn test_unreadable_directory_is_not_fatal() {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write(dir.path(), "a.bin", b"duplicate");
    write(dir.path(), "b.bin", b"duplicate");
    let locked = dir.path().join("locked");
    write(dir.path(), "locked/c.bin", b"duplicate");
    fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

    // Root ignores permission bits.
    if fs::read_dir(&locked).is_ok() {
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    for profile in PROFILES {
        let (sets, summary) = find(dir.path(), profile, 2);
        assert_eq!(sets.len(), 1);
        assert_eq!(sets[0].len(), 2);
        assert_eq!(summary.scan_errors.len(), 1);
        assert_eq!(summary.warning_count(), 1);
    }

    fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
}

#[test]
fn test_sets_are_ordered_by_size_descending() {
    let dir = tempdir().unwrap();
    for (len, seed) in [(100, 1u8), (5000, 2), (300, 3)] {
        let content = pattern(len, seed);
        write(dir.path(), &format!("x{len}"), &content);
        write(dir.path(), &format!("y{len}"), &content);
    }

    let (sets, summary) = find(dir.path(), StorageProfile::Rotating, 1);
    let sizes: Vec<u64> = sets.iter().map(|s| s.size()).collect();
    assert_eq!(sizes, vec![5000, 300, 100]);
    assert_eq!(summary.reclaimable_space, 5400);
}
