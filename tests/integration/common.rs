use dupsweep::actions::{ConfirmMode, Prompter, ResolveSummary, Resolver, ResolverConfig};
use dupsweep::duplicates::{DuplicateFinder, DuplicateSet, FinderConfig, ScanSummary};
use dupsweep::output::{Reporter, SharedBuffer};
use dupsweep::storage::StorageProfile;
use std::fs;
use std::path::{Path, PathBuf};

pub const PROFILES: [StorageProfile; 2] = [StorageProfile::Rotating, StorageProfile::SolidState];

/// Write `content` to `root/rel`, creating parent directories.
pub fn write(root: &Path, rel: &str, content: &[u8]) -> PathBuf {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}

/// Deterministic pseudo-random bytes.
pub fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| ((i as u64 * 31 + u64::from(seed) * 7) % 251) as u8)
        .collect()
}

pub fn find(root: &Path, profile: StorageProfile, workers: usize) -> (Vec<DuplicateSet>, ScanSummary) {
    let config = FinderConfig::default()
        .with_profile(profile)
        .with_workers(workers)
        .with_recursive(true);
    DuplicateFinder::new(config).find_duplicates(root).unwrap()
}

/// Outcome of a scan followed by resolution.
pub struct RunOutput {
    pub sets: Vec<DuplicateSet>,
    pub summary: ResolveSummary,
    pub report: String,
}

/// Scan `root` recursively and resolve every set.
pub fn dedup(
    root: &Path,
    profile: StorageProfile,
    workers: usize,
    mode: ConfirmMode,
    prompter: &dyn Prompter,
) -> RunOutput {
    let (sets, scan) = find(root, profile, workers);

    let buffer = SharedBuffer::new();
    let reporter = Reporter::new(&scan.root, Box::new(buffer.clone()), false);
    let resolver = Resolver::new(
        ResolverConfig::default().with_workers(workers),
        prompter,
        &reporter,
    );
    let summary = resolver.resolve(&sets, mode).unwrap();
    reporter.line(&summary.to_string());

    RunOutput {
        sets,
        summary,
        report: buffer.contents(),
    }
}

/// Relative paths of all regular files under `root`, sorted.
pub fn files_under(root: &Path) -> Vec<String> {
    fn visit(dir: &Path, root: &Path, out: &mut Vec<String>) {
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                visit(&path, root, out);
            } else {
                out.push(path.strip_prefix(root).unwrap().display().to_string());
            }
        }
    }
    let mut out = Vec::new();
    visit(root, root, &mut out);
    out.sort();
    out
}
