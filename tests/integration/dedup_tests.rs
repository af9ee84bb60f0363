use super::common::{dedup, files_under, pattern, write, PROFILES};
use dupsweep::actions::{ConfirmMode, ScriptedPrompter};
use std::path::Path;
use tempfile::tempdir;

const MIB: usize = 1024 * 1024;

fn no_answers() -> ScriptedPrompter {
    ScriptedPrompter::new(Vec::<String>::new())
}

fn build_scenario(root: &Path) {
    let same = pattern(MIB, 1);
    write(root, "a/1.bin", &same);
    write(root, "a/2.bin", &same);
    write(root, "b/3.bin", &same);
    write(root, "a/4.bin", &pattern(MIB, 2));
}

#[test]
fn test_end_to_end_scenario() {
    for profile in PROFILES {
        for workers in [1, 4] {
            let dir = tempdir().unwrap();
            build_scenario(dir.path());

            let prompter = no_answers();
            let run = dedup(dir.path(), profile, workers, ConfirmMode::AutoAll, &prompter);

            assert_eq!(run.summary.removed, 2, "{profile} x{workers}");
            assert_eq!(run.summary.candidates, 3);
            assert!(run.report.ends_with("2 removed / 3 candidates\n"));
            assert_eq!(files_under(dir.path()), vec!["a/1.bin", "a/4.bin"]);
            assert_eq!(prompter.asked(), 0);
        }
    }
}

#[test]
fn test_report_block_layout() {
    let dir = tempdir().unwrap();
    build_scenario(dir.path());

    let run = dedup(
        dir.path(),
        PROFILES[0],
        2,
        ConfirmMode::AutoAll,
        &no_answers(),
    );

    let digest = run.sets[0].digest_hex();
    let lines: Vec<&str> = run.report.lines().collect();
    let size = bytesize::ByteSize::b(MIB as u64);
    assert_eq!(lines[0], format!("[3 files | {} | {}]", size, &digest[..16]));
    assert_eq!(lines[1], "  keep: a/1.bin");
    assert_eq!(lines[2], "  delete: a/2.bin");
    assert_eq!(lines[3], "  delete: b/3.bin");
    assert_eq!(lines[4], "  deleted: a/2.bin");
    assert_eq!(lines[5], "  deleted: b/3.bin");
}

#[test]
fn test_second_run_is_idempotent() {
    for profile in PROFILES {
        let dir = tempdir().unwrap();
        build_scenario(dir.path());

        let first = dedup(dir.path(), profile, 3, ConfirmMode::AutoAll, &no_answers());
        assert_eq!(first.summary.removed, 2);

        let second = dedup(dir.path(), profile, 3, ConfirmMode::AutoAll, &no_answers());
        assert_eq!(second.summary.removed, 0);
        assert!(second.sets.is_empty());
        assert_eq!(second.report, "0 removed / 0 candidates\n");
    }
}

fn build_many_sets(root: &Path, sets: usize, copies: usize) {
    for set in 0..sets {
        let content = pattern(1000 + set, set as u8);
        for copy in 0..copies {
            write(root, &format!("d{}/s{set}_{copy}.bin", copy % 3), &content);
        }
    }
}

#[test]
fn test_removed_count_independent_of_pool_size() {
    let mut counts = Vec::new();
    for profile in PROFILES {
        for workers in [1, 8] {
            let dir = tempdir().unwrap();
            build_many_sets(dir.path(), 20, 3);

            let run = dedup(dir.path(), profile, workers, ConfirmMode::AutoAll, &no_answers());
            counts.push(run.summary.removed);
            assert_eq!(files_under(dir.path()).len(), 20);
        }
    }
    assert!(counts.iter().all(|&c| c == 40), "{counts:?}");
}

#[test]
fn test_survivor_is_deterministic() {
    let mut survivors = Vec::new();
    for profile in PROFILES {
        for workers in [1, 5] {
            let dir = tempdir().unwrap();
            let content = pattern(50_000, 9);
            for name in ["z/copy.bin", "m/copy.bin", "a/z.bin", "a/b/c.bin"] {
                write(dir.path(), name, &content);
            }

            dedup(dir.path(), profile, workers, ConfirmMode::AutoAll, &no_answers());
            survivors.push(files_under(dir.path()));
        }
    }
    assert!(survivors.iter().all(|s| s == &vec!["a/b/c.bin".to_string()]));
}

#[test]
fn test_all_answer_stops_prompting() {
    for workers in [1, 4] {
        let dir = tempdir().unwrap();
        build_many_sets(dir.path(), 6, 2);

        let prompter = ScriptedPrompter::new(["y", "a"]);
        let run = dedup(dir.path(), PROFILES[1], workers, ConfirmMode::Manual, &prompter);

        assert_eq!(prompter.asked(), 2, "x{workers}");
        assert_eq!(run.summary.removed, 6);
        assert_eq!(run.summary.skipped_sets, 0);
    }
}

#[test]
fn test_negative_answer_skips_only_that_set() {
    let dir = tempdir().unwrap();
    build_many_sets(dir.path(), 3, 2);

    let prompter = ScriptedPrompter::new(["n", "y", "y"]);
    let run = dedup(dir.path(), PROFILES[0], 1, ConfirmMode::Manual, &prompter);

    assert_eq!(prompter.asked(), 3);
    assert_eq!(run.summary.removed, 2);
    assert_eq!(run.summary.skipped_sets, 1);
    assert_eq!(files_under(dir.path()).len(), 4);
    assert!(run.report.contains("  skipped: declined\n"));
}

#[test]
fn test_end_of_input_skips_remaining_sets() {
    let dir = tempdir().unwrap();
    build_many_sets(dir.path(), 3, 2);

    let prompter = ScriptedPrompter::new(["y"]);
    let run = dedup(dir.path(), PROFILES[0], 2, ConfirmMode::Manual, &prompter);

    assert_eq!(prompter.asked(), 3);
    assert_eq!(run.summary.removed, 1);
    assert_eq!(run.summary.skipped_sets, 2);
    assert!(run.report.contains("skipped: end of input"));
}

#[test]
fn test_manual_header_precedes_prompt_answer() {
    let dir = tempdir().unwrap();
    build_many_sets(dir.path(), 1, 3);

    let prompter = ScriptedPrompter::new(["y"]);
    let run = dedup(dir.path(), PROFILES[0], 1, ConfirmMode::Manual, &prompter);

    let lines: Vec<&str> = run.report.lines().collect();
    assert!(lines[0].starts_with("[3 files | "));
    assert!(lines[1].starts_with("  keep: "));
    assert_eq!(lines.iter().filter(|l| l.starts_with("  deleted: ")).count(), 2);
}
