use proptest::prelude::*;
use dupsweep::actions::confirm::{parse_response, Response};
use dupsweep::actions::{ConfirmMode, RunState};
use dupsweep::duplicates::{group_by_size, DuplicateSet};
use dupsweep::scanner::{Candidate, FullVerifier, SamplingHasher, SamplingPolicy};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn policies() -> impl Strategy<Value = SamplingPolicy> {
    prop_oneof![
        (1u64..64 * 1024).prop_map(|sample| SamplingPolicy::HeadTail { sample }),
        (0u64..1 << 20, 512u64..8192, 0.01f64..0.5).prop_map(|(limit, block, ratio)| {
            SamplingPolicy::Strided {
                whole_file_limit: limit,
                block,
                ratio,
            }
        }),
    ]
}

proptest! {
    #[test]
    fn test_sample_ranges_stay_in_bounds(policy in policies(), len in 0u64..1 << 26) {
        let ranges = policy.sample_ranges(len);
        prop_assert!(!ranges.is_empty());

        let mut cursor = 0;
        for (offset, length) in ranges {
            prop_assert!(offset >= cursor, "overlap or disorder at {}", offset);
            prop_assert!(offset + length <= len);
            cursor = offset + length;
        }
    }

    #[test]
    fn test_sample_ranges_start_at_zero(policy in policies(), len in 1u64..1 << 26) {
        prop_assert_eq!(policy.sample_ranges(len)[0].0, 0);
    }

    #[test]
    fn test_head_tail_reaches_last_byte(sample in 1u64..64 * 1024, len in 1u64..1 << 34) {
        let policy = SamplingPolicy::HeadTail { sample };
        let last = *policy.sample_ranges(len).last().unwrap();
        prop_assert_eq!(last.0 + last.1, len);
    }

    #[test]
    fn test_identical_content_same_digests(content in proptest::collection::vec(any::<u8>(), 1..50_000)) {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        fs::write(&a, &content).unwrap();
        fs::write(&b, &content).unwrap();

        for policy in [SamplingPolicy::head_tail(), SamplingPolicy::strided()] {
            let hasher = SamplingHasher::new(policy);
            prop_assert_eq!(hasher.digest(&a).unwrap(), hasher.digest(&b).unwrap());
        }
        let verifier = FullVerifier::new();
        let len = content.len() as u64;
        prop_assert_eq!(verifier.digest(&a, len).unwrap(), verifier.digest(&b, len).unwrap());
    }

    #[test]
    fn test_parse_response_ignores_case_and_padding(
        word in prop::sample::select(vec!["", "y", "yes", "a", "all", "ya", "n", "no"]),
        upper in any::<bool>(),
        pad in "[ \t]{0,3}",
    ) {
        let cased = if upper { word.to_uppercase() } else { word.to_string() };
        let input = format!("{pad}{cased}{pad}\n");
        let expected = match word {
            "" | "y" | "yes" => Response::Yes,
            "a" | "all" | "ya" => Response::All,
            _ => Response::No,
        };
        prop_assert_eq!(parse_response(&input), Some(expected));
    }

    #[test]
    fn test_parse_response_rejects_other_words(word in "[b-mo-xz]{2,8}") {
        prop_assert_eq!(parse_response(&word), None);
    }

    #[test]
    fn test_keeper_is_smallest_path(names in proptest::collection::hash_set("[a-z]{1,6}(/[a-z]{1,6}){0,2}", 2..12)
        .prop_map(|s| s.into_iter().collect::<Vec<_>>())
        .prop_shuffle()
    ) {
        let paths: Vec<PathBuf> = names.iter().map(PathBuf::from).collect();
        let smallest = paths.iter().min().unwrap().clone();

        let set = DuplicateSet::new(10, [0u8; 32], paths).unwrap();
        prop_assert_eq!(set.keeper(), smallest.as_path());
        prop_assert_eq!(set.removals().len(), set.len() - 1);
        prop_assert!(!set.removals().contains(&smallest));
    }

    #[test]
    fn test_group_by_size_invariants(sizes in proptest::collection::vec(0u64..20, 0..60)) {
        let files: Vec<Candidate> = sizes
            .iter()
            .enumerate()
            .map(|(i, &size)| Candidate::new(PathBuf::from(format!("/f{i}")), size))
            .collect();

        let (groups, stats) = group_by_size(files);

        let mut seen = HashSet::new();
        for (size, members) in &groups {
            prop_assert!(*size > 0);
            prop_assert!(members.len() >= 2);
            for member in members {
                prop_assert_eq!(member.size, *size);
                prop_assert!(seen.insert(member.path.clone()));
            }
        }
        prop_assert_eq!(stats.total_files, sizes.len());
        prop_assert_eq!(
            stats.empty_files + stats.eliminated_unique + stats.potential_duplicates,
            sizes.len()
        );
        prop_assert_eq!(seen.len(), stats.potential_duplicates);
    }

    #[test]
    fn test_escalation_is_monotonic(ops in proptest::collection::vec(any::<bool>(), 0..40)) {
        let state = RunState::new(ConfirmMode::Manual);
        let mut escalated = false;
        let mut changes = 0;
        for escalate in ops {
            if escalate && state.escalate() {
                changes += 1;
            }
            escalated |= escalate;
            let expected = if escalated { ConfirmMode::AutoAll } else { ConfirmMode::Manual };
            prop_assert_eq!(state.mode(), expected);
        }
        prop_assert!(changes <= 1);
    }
}
