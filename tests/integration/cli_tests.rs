use super::common::{files_under, pattern, write};
use clap::Parser;
use dupsweep::cli::Cli;
use dupsweep::error::ExitCode;
use dupsweep::run_app;
use tempfile::tempdir;

fn run(args: &[&str]) -> anyhow::Result<ExitCode> {
    let mut argv = vec!["dupsweep", "-q", "--no-color"];
    argv.extend_from_slice(args);
    run_app(Cli::try_parse_from(argv).unwrap())
}

#[test]
fn test_dedup_subcommand_removes_copies() {
    let dir = tempdir().unwrap();
    let content = pattern(70_000, 4);
    write(dir.path(), "one/a.bin", &content);
    write(dir.path(), "two/a.bin", &content);
    write(dir.path(), "two/b.bin", &pattern(70_000, 5));
    let root = dir.path().to_str().unwrap();

    let code = run(&["dedup", root, "-r", "-y", "--profile", "solid-state"]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(files_under(dir.path()), vec!["one/a.bin", "two/b.bin"]);
}

#[test]
fn test_dry_run_touches_nothing() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"copy");
    write(dir.path(), "b.txt", b"copy");
    let root = dir.path().to_str().unwrap();

    let code = run(&["dedup", root, "-y", "--dry-run", "--profile", "rotating"]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(files_under(dir.path()).len(), 2);
}

#[test]
fn test_scan_subcommand_is_read_only() {
    let dir = tempdir().unwrap();
    write(dir.path(), "x/a.txt", b"copy");
    write(dir.path(), "y/b.txt", b"copy");
    let root = dir.path().to_str().unwrap();

    let code = run(&["scan", root, "-r", "-j", "2", "--profile", "rotating"]).unwrap();

    assert_eq!(code, ExitCode::Success);
    assert_eq!(files_under(dir.path()).len(), 2);
}

#[test]
fn test_excluded_path_survives() {
    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"copy");
    let protected = write(dir.path(), "b.txt", b"copy");
    write(dir.path(), "c.txt", b"copy");
    let root = dir.path().to_str().unwrap();
    let protected = protected.canonicalize().unwrap();

    run(&[
        "dedup",
        root,
        "-y",
        "--profile",
        "rotating",
        "--exclude",
        protected.to_str().unwrap(),
    ])
    .unwrap();

    assert_eq!(files_under(dir.path()), vec!["a.txt", "b.txt"]);
}

#[test]
fn test_invalid_root_is_general_error() {
    let dir = tempdir().unwrap();
    let missing = dir.path().join("missing");

    let err = run(&["scan", missing.to_str().unwrap()]).unwrap_err();

    assert_eq!(ExitCode::for_error(&err), ExitCode::GeneralError);
    assert!(format!("{err:#}").contains("Path not found"));
}

#[cfg(unix)]
#[test]
fn test_failed_deletion_is_partial_success() {
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    let dir = tempdir().unwrap();
    write(dir.path(), "a.txt", b"copy");
    write(dir.path(), "sealed/b.txt", b"copy");
    let sealed = dir.path().join("sealed");
    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o555)).unwrap();

    // Root ignores permission bits.
    let probe = sealed.join("probe");
    if fs::write(&probe, b"").is_ok() {
        fs::remove_file(&probe).unwrap();
        fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).unwrap();
        return;
    }

    let root = dir.path().to_str().unwrap();
    let code = run(&["dedup", root, "-r", "-y", "--profile", "rotating"]).unwrap();

    fs::set_permissions(&sealed, fs::Permissions::from_mode(0o755)).unwrap();
    assert_eq!(code, ExitCode::PartialSuccess);
    assert_eq!(files_under(dir.path()), vec!["a.txt", "sealed/b.txt"]);
}
