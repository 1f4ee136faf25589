//! Per-file reader/writer locks.
//!
//! Mutating actions hold a file's lock exclusively for the whole
//! load-mutate-rewrite cycle; reads hold it shared. Locks are keyed by the
//! route's file path; an entry lives only while a guard or waiter holds it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock};

type LockMap = DashMap<PathBuf, Arc<RwLock<()>>>;

enum Held {
    Shared(OwnedRwLockReadGuard<()>),
    Exclusive(OwnedRwLockWriteGuard<()>),
}

/// Guard over one document file; the lock is released on drop.
pub struct FileGuard {
    held: Option<Held>,
    path: PathBuf,
    locks: Arc<LockMap>,
}

impl FileGuard {
    pub fn is_exclusive(&self) -> bool {
        matches!(self.held, Some(Held::Exclusive(_)))
    }
}

impl Drop for FileGuard {
    fn drop(&mut self) {
        // Release first so our own reference is gone before the count check.
        self.held.take();
        self.locks
            .remove_if(&self.path, |_, lock| Arc::strong_count(lock) == 1);
    }
}

#[derive(Debug, Clone, Default)]
pub struct FileLocks {
    inner: Arc<LockMap>,
}

impl FileLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, path: &Path) -> Arc<RwLock<()>> {
        // Clone out of the map so no shard lock is held across an await.
        self.inner.entry(path.to_path_buf()).or_default().clone()
    }

    fn guard(&self, path: &Path, held: Held) -> FileGuard {
        FileGuard {
            held: Some(held),
            path: path.to_path_buf(),
            locks: self.inner.clone(),
        }
    }

    pub async fn shared(&self, path: &Path) -> FileGuard {
        let held = Held::Shared(self.lock_for(path).read_owned().await);
        self.guard(path, held)
    }

    pub async fn exclusive(&self, path: &Path) -> FileGuard {
        let held = Held::Exclusive(self.lock_for(path).write_owned().await);
        self.guard(path, held)
    }

    /// Number of files currently locked or waited on.
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}
