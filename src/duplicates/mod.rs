//! Duplicate detection module.
//!
//! This module provides functionality for:
//! - Size-based file grouping
//! - Sample-digest narrowing
//! - Full-content verification into duplicate sets
//! - Pipeline orchestration

pub mod finder;
pub mod groups;

pub use finder::{
    phase2_sample, phase3_verify, DuplicateFinder, FinderConfig, FinderError, FingerprintGroups,
    SampleStats, ScanSummary, VerifyStats,
};
pub use groups::{group_by_size, DuplicateSet, FingerprintKey, GroupingStats, SizeGroups};
