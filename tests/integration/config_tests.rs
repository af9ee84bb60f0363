use clap::Parser;
use dupsweep::cli::{Cli, Commands, ProfileArg};
use dupsweep::config::{Config, ConfigError};
use figment::providers::{Env, Serialized};
use figment::Figment;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    // Figment without Env keeps this independent of the environment
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_load_from_env() {
    std::env::set_var("DUPSWEEP_TEST_WORKERS", "16");
    std::env::set_var("DUPSWEEP_TEST_PROFILE", "rotating");

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Env::prefixed("DUPSWEEP_TEST_"))
        .extract()
        .unwrap();

    assert_eq!(config.workers, Some(16));
    assert_eq!(config.profile, ProfileArg::Rotating);

    std::env::remove_var("DUPSWEEP_TEST_WORKERS");
    std::env::remove_var("DUPSWEEP_TEST_PROFILE");
}

#[test]
fn test_env_overrides_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "workers = 3\nrecursive = true\n").unwrap();
    std::env::set_var("DUPSWEEP_LAYER_WORKERS", "9");

    let config: Config = Config::figment(Some(&path))
        .unwrap()
        .merge(Env::prefixed("DUPSWEEP_LAYER_"))
        .extract()
        .unwrap();

    assert_eq!(config.workers, Some(9));
    assert!(config.recursive);

    std::env::remove_var("DUPSWEEP_LAYER_WORKERS");
}

#[test]
fn test_cli_flags_override_file() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(
        &path,
        "profile = \"rotating\"\nworkers = 3\nexclude = [\"/from/file\"]\n",
    )
    .unwrap();

    let cli = Cli::try_parse_from([
        "dupsweep",
        "dedup",
        "/data",
        "-r",
        "--profile",
        "solid-state",
        "-j",
        "7",
        "--exclude",
        "/from/flag",
        "--trash",
        "--config",
        path.to_str().unwrap(),
    ])
    .unwrap();
    let Commands::Dedup(args) = cli.command else {
        panic!("expected dedup");
    };

    let mut config: Config = Config::figment(args.scan.config.as_deref())
        .unwrap()
        .extract()
        .unwrap();
    args.apply(&mut config);

    assert_eq!(config.profile, ProfileArg::SolidState);
    assert_eq!(config.workers, Some(7));
    assert!(config.recursive);
    assert!(config.trash);
    assert_eq!(
        config.exclude,
        vec![PathBuf::from("/from/file"), PathBuf::from("/from/flag")]
    );
}

#[test]
fn test_unset_flags_keep_file_values() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "recursive = true\ntrash = true\nworkers = 5\n").unwrap();

    let cli = Cli::try_parse_from(["dupsweep", "dedup", "--config", path.to_str().unwrap()])
        .unwrap();
    let Commands::Dedup(args) = cli.command else {
        panic!("expected dedup");
    };
    let mut config: Config = Config::figment(Some(&path)).unwrap().extract().unwrap();
    args.apply(&mut config);

    assert!(config.recursive);
    assert!(config.trash);
    assert_eq!(config.workers, Some(5));
    assert_eq!(args.scan.path, PathBuf::from("."));
}

#[test]
fn test_zero_workers_rejected() {
    assert!(Cli::try_parse_from(["dupsweep", "scan", "-j", "0"]).is_err());
}

#[test]
fn test_unknown_profile_rejected() {
    assert!(Cli::try_parse_from(["dupsweep", "scan", "--profile", "tape"]).is_err());
}

#[test]
fn test_missing_config_file_is_error() {
    let err = Config::load(Some(std::path::Path::new("/nonexistent/dupsweep.toml"))).unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(_)));
}

#[test]
fn test_rendered_toml_reloads() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let config = Config {
        profile: ProfileArg::SolidState,
        workers: Some(6),
        recursive: true,
        exclude: vec![PathBuf::from("/keep/me")],
        bfs_batch_size: 42,
        trash: true,
    };
    fs::write(&path, config.to_toml().unwrap()).unwrap();

    let reloaded: Config = Config::figment(Some(&path)).unwrap().extract().unwrap();
    assert_eq!(reloaded, config);
}
