//! Snapshot storage.
//!
//! The breaker only touches its store while holding its own lock, so
//! implementations take `&mut self` and need no synchronization of their
//! own. A store backed by a remote service must still treat the breaker's
//! fetch → push sequence as one critical section per process.

use crate::resilience::types::{FuseResult, Snapshot};

/// Backend storage for a single fuse snapshot.
pub trait SnapshotStore: Send {
    /// Return the current snapshot.
    fn fetch(&mut self) -> FuseResult<Snapshot>;

    /// Replace the current snapshot.
    fn push(&mut self, snapshot: Snapshot) -> FuseResult<()>;
}

/// In-process store holding the snapshot directly.
#[derive(Debug, Clone)]
pub struct MemoryStore {
    snapshot: Snapshot,
}

impl MemoryStore {
    pub fn new(snapshot: Snapshot) -> Self {
        Self { snapshot }
    }
}

impl SnapshotStore for MemoryStore {
    fn fetch(&mut self) -> FuseResult<Snapshot> {
        Ok(self.snapshot)
    }

    fn push(&mut self, snapshot: Snapshot) -> FuseResult<()> {
        self.snapshot = snapshot;
        Ok(())
    }
}
