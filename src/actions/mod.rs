//! Duplicate resolution.
//!
//! This module provides functionality for:
//! - Confirmation of each set, with a run-wide auto-all escalation
//! - Removal of redundant copies, permanently or to the recycle bin
//! - Concurrent resolution of many sets on a bounded pool
//!
//! ```no_run
//! use dupsweep::actions::delete::{delete_checked, DeleteMethod};
//! use std::path::Path;
//!
//! let result = delete_checked(Path::new("/data/copy.bin"), 4096, DeleteMethod::Permanent);
//! ```

pub mod confirm;
pub mod delete;
pub mod resolver;

// Re-export commonly used types
pub use confirm::{
    parse_response, ConfirmMode, Confirmer, Decision, Prompter, Response, RunState,
    ScriptedPrompter, StdinPrompter,
};
pub use delete::{
    check_size, delete_checked, delete_file, verify_keeper, DeleteError, DeleteMethod,
    DeleteResult,
};
pub use resolver::{ResolveSummary, Resolver, ResolverConfig, DEFAULT_RESOLVE_WORKERS};
