//! Storage-medium profiles.
//!
//! A profile bundles the I/O policy choices that depend on seek cost:
//! traversal order, sampling strategy and default pool size.

use std::path::Path;

use serde::{Deserialize, Serialize};
use sysinfo::{DiskKind, Disks};

/// Default worker count for rotating media; keeps the head from thrashing.
pub const ROTATING_WORKERS: usize = 4;

/// Default worker count for solid-state media.
pub const SOLID_STATE_WORKERS: usize = 10;

/// I/O profile of the storage holding the scan root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageProfile {
    /// High seek latency: batched locality-ordered walk, head/tail sampling.
    Rotating,
    /// Negligible seek latency: concurrent fan-out walk, strided sampling.
    SolidState,
}

impl StorageProfile {
    /// Default worker pool size for this profile.
    #[must_use]
    pub fn default_workers(self) -> usize {
        match self {
            Self::Rotating => ROTATING_WORKERS,
            Self::SolidState => SOLID_STATE_WORKERS,
        }
    }

    /// Short name used in logs and reports.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Rotating => "rotating",
            Self::SolidState => "solid-state",
        }
    }

    /// Map a disk kind reported by the OS to a profile.
    ///
    /// Unknown kinds map to [`StorageProfile::Rotating`].
    #[must_use]
    pub fn from_disk_kind(kind: DiskKind) -> Self {
        match kind {
            DiskKind::SSD => Self::SolidState,
            DiskKind::HDD | DiskKind::Unknown(_) => Self::Rotating,
        }
    }
}

impl std::fmt::Display for StorageProfile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Detect the profile for the disk holding `root`.
///
/// Picks the disk whose mount point is the longest prefix of the canonical
/// root. Falls back to [`StorageProfile::Rotating`] when nothing matches.
#[must_use]
pub fn detect_profile(root: &Path) -> StorageProfile {
    let root = root.canonicalize().unwrap_or_else(|_| root.to_path_buf());
    let disks = Disks::new_with_refreshed_list();

    let best = disks
        .list()
        .iter()
        .filter(|disk| root.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().components().count());

    match best {
        Some(disk) => {
            let profile = StorageProfile::from_disk_kind(disk.kind());
            log::debug!(
                "Detected {} storage for {} (mount {}, kind {:?})",
                profile,
                root.display(),
                disk.mount_point().display(),
                disk.kind()
            );
            profile
        }
        None => {
            log::debug!(
                "No disk matched {}, assuming rotating storage",
                root.display()
            );
            StorageProfile::Rotating
        }
    }
}
