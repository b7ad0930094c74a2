//! Resource lock manager
//!
//! Per-path mutual exclusion for every operation touching a given file.
//! Process-local only — two OS processes on the same files are not
//! coordinated.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;

/// Shared per-path locks used to serialize shard scans, appends, rewrites
/// and catalog persists.
///
/// Locks are created lazily on first use and kept for the lifetime of the
/// manager. Distinct paths are independent; the same path serializes all
/// operations requesting it, in arrival order.
pub struct LockManager {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl LockManager {
    pub fn new() -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Get (or create) the lock for a path
    fn lock_for(&self, path: &Path) -> Arc<Mutex<()>> {
        let mut guard = self.locks.lock();
        guard
            .entry(path.to_path_buf())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Run `op` while holding exclusive access to `path`.
    ///
    /// The lock is released on every exit path, including errors: the
    /// guard drops when this frame unwinds or returns.
    pub fn with_lock<T>(&self, path: &Path, op: impl FnOnce() -> Result<T>) -> Result<T> {
        let lock = self.lock_for(path);
        let _guard = lock.lock();
        op()
    }

    /// Number of distinct paths that have been locked so far
    pub fn lock_count(&self) -> usize {
        self.locks.lock().len()
    }
}

impl Default for LockManager {
    fn default() -> Self {
        Self::new()
    }
}
