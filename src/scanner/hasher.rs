//! Bounded-cost sample digests.
//!
//! # Overview
//!
//! The [`SamplingHasher`] computes a cheap XxHash64 fingerprint over part of
//! a file. It narrows same-size groups before the expensive full-content
//! verification; equal fingerprints never prove equality on their own.
//!
//! Two policies are provided:
//!
//! - [`SamplingPolicy::HeadTail`] (rotating media): first and last 16 KiB.
//!   Files of at most 32 KiB are hashed once in full, so overlapping bytes
//!   are never counted twice.
//! - [`SamplingPolicy::Strided`] (solid-state media): files up to 1 MiB are
//!   hashed in full; larger files are sampled as 4 KiB blocks at evenly
//!   spaced offsets covering about 10% of the file.

use std::fs::File;
use std::hash::Hasher as _;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use twox_hash::XxHash64;

use super::HashError;
use crate::storage::StorageProfile;

/// A sample fingerprint.
pub type SampleDigest = u64;

/// Bytes read from each end of the file by the head/tail policy.
pub const HEAD_TAIL_SAMPLE: u64 = 16 * 1024;

/// Files up to this size are hashed in full by the strided policy.
pub const STRIDE_WHOLE_FILE_LIMIT: u64 = 1024 * 1024;

/// Block size of the strided policy (one page).
pub const STRIDE_BLOCK: u64 = 4096;

/// Fraction of a large file covered by strided blocks.
pub const STRIDE_RATIO: f64 = 0.1;

/// Read buffer for sampling.
const READ_BUFFER: usize = 64 * 1024;

/// Which bytes of a file contribute to its fingerprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SamplingPolicy {
    /// Hash the head and the tail of the file.
    HeadTail {
        /// Bytes taken from each end
        sample: u64,
    },
    /// Hash evenly spaced blocks of large files.
    Strided {
        /// Files up to this size are hashed in full
        whole_file_limit: u64,
        /// Size of each sampled block
        block: u64,
        /// Fraction of the file to cover
        ratio: f64,
    },
}

impl SamplingPolicy {
    /// Head/tail policy with the default sample size.
    #[must_use]
    pub fn head_tail() -> Self {
        Self::HeadTail {
            sample: HEAD_TAIL_SAMPLE,
        }
    }

    /// Strided policy with the default parameters.
    #[must_use]
    pub fn strided() -> Self {
        Self::Strided {
            whole_file_limit: STRIDE_WHOLE_FILE_LIMIT,
            block: STRIDE_BLOCK,
            ratio: STRIDE_RATIO,
        }
    }

    /// Policy matching a storage profile.
    #[must_use]
    pub fn for_profile(profile: StorageProfile) -> Self {
        match profile {
            StorageProfile::Rotating => Self::head_tail(),
            StorageProfile::SolidState => Self::strided(),
        }
    }

    /// Byte ranges `(offset, length)` sampled from a file of `len` bytes.
    ///
    /// Ranges are in ascending offset order and never overlap.
    #[must_use]
    pub fn sample_ranges(&self, len: u64) -> Vec<(u64, u64)> {
        match *self {
            Self::HeadTail { sample } => {
                if len <= sample.saturating_mul(2) {
                    vec![(0, len)]
                } else {
                    vec![(0, sample), (len - sample, sample)]
                }
            }
            Self::Strided {
                whole_file_limit,
                block,
                ratio,
            } => {
                let block = block.max(1);
                if len <= whole_file_limit || len <= block {
                    return vec![(0, len)];
                }
                let sample_bytes = ((len as f64 * ratio) as u64).max(block);
                let count = (sample_bytes / block).max(1);
                let step = len / count;
                (0..count)
                    .map(|i| {
                        let offset = i * step;
                        (offset, block.min(len - offset))
                    })
                    .collect()
            }
        }
    }
}

/// Computes sample digests under a fixed policy.
#[derive(Debug, Clone)]
pub struct SamplingHasher {
    policy: SamplingPolicy,
}

impl SamplingHasher {
    /// Create a hasher with the given policy.
    #[must_use]
    pub fn new(policy: SamplingPolicy) -> Self {
        Self { policy }
    }

    /// Create a hasher for a storage profile.
    #[must_use]
    pub fn for_profile(profile: StorageProfile) -> Self {
        Self::new(SamplingPolicy::for_profile(profile))
    }

    /// The active policy.
    #[must_use]
    pub fn policy(&self) -> SamplingPolicy {
        self.policy
    }

    /// Compute the sample digest of a file.
    ///
    /// The layout is derived from the length of the opened file, so a file
    /// that changed size since scanning simply produces a different digest.
    ///
    /// # Errors
    ///
    /// Returns [`HashError`] if the file vanished, is unreadable, or is
    /// truncated while being read.
    pub fn digest(&self, path: &Path) -> Result<SampleDigest, HashError> {
        let mut file = File::open(path).map_err(|e| HashError::from_io(path, e))?;
        let len = file
            .metadata()
            .map_err(|e| HashError::from_io(path, e))?
            .len();

        let mut hasher = XxHash64::with_seed(0);
        let mut buffer = vec![0u8; READ_BUFFER];

        for (offset, length) in self.policy.sample_ranges(len) {
            file.seek(SeekFrom::Start(offset))
                .map_err(|e| HashError::from_io(path, e))?;
            let mut remaining = length;
            while remaining > 0 {
                let chunk = remaining.min(buffer.len() as u64) as usize;
                file.read_exact(&mut buffer[..chunk])
                    .map_err(|e| HashError::from_io(path, e))?;
                hasher.write(&buffer[..chunk]);
                remaining -= chunk as u64;
            }
        }

        Ok(hasher.finish())
    }
}
