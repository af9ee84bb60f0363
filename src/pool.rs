//! Bounded worker pools.
//!
//! Every concurrent stage (fan-out traversal, both hashing phases and
//! per-set resolution) runs on a dedicated rayon pool of a fixed size so the
//! I/O parallelism matches the storage profile instead of the CPU count.

use std::sync::{Mutex, MutexGuard, PoisonError};

use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// Build a pool with exactly `threads` workers (minimum 1).
///
/// # Errors
///
/// Returns an error if the OS refuses to spawn the worker threads.
pub fn worker_pool(threads: usize) -> Result<ThreadPool, ThreadPoolBuildError> {
    ThreadPoolBuilder::new()
        .num_threads(threads.max(1))
        .thread_name(|i| format!("dupsweep-worker-{i}"))
        .build()
}

/// Lock a mutex, recovering the data if a worker panicked while holding it.
///
/// Guarded values here are append-only collections and counters, which stay
/// consistent even if a holder unwound mid-operation.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
