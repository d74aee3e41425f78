//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use polyfuse::resilience::clock::ManualClock;
use polyfuse::resilience::store::{MemoryStore, SnapshotStore};
use polyfuse::{DecayingFuse, FuseError, FuseResult, FuseSettings, Snapshot};

/// Fixed starting point for manual clocks.
pub fn epoch() -> SystemTime {
    UNIX_EPOCH + Duration::from_secs(1_700_000_000)
}

pub fn snapshot(request: f64, error: f64, timestamp: SystemTime) -> Snapshot {
    Snapshot {
        request_count: request,
        error_count: error,
        timestamp,
    }
}

/// Settings with every check disabled and a 10s window.
pub fn settings(id: &str) -> FuseSettings {
    FuseSettings {
        timeframe_secs: 10,
        max_request: 0,
        max_error: 0,
        error_rate: 0,
        ramp_secs: 10,
        ..FuseSettings::new(id)
    }
}

/// Build a fuse on a manual clock, seeded with `seed`.
pub fn build_fuse(settings: FuseSettings, seed: Snapshot) -> (DecayingFuse, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(epoch()));
    let fuse = DecayingFuse::builder(settings)
        .clock(clock.clone())
        .store(MemoryStore::new(seed))
        .build()
        .expect("valid settings");
    (fuse, clock)
}

/// A store that can be switched into failing on fetch or push.
#[derive(Clone)]
pub struct FlakyStore {
    inner: MemoryStore,
    pub fail_fetch: Arc<AtomicBool>,
    pub fail_push: Arc<AtomicBool>,
}

impl FlakyStore {
    pub fn new(seed: Snapshot) -> Self {
        Self {
            inner: MemoryStore::new(seed),
            fail_fetch: Arc::new(AtomicBool::new(false)),
            fail_push: Arc::new(AtomicBool::new(false)),
        }
    }
}

impl SnapshotStore for FlakyStore {
    fn fetch(&mut self) -> FuseResult<Snapshot> {
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(FuseError::StoreUnavailable("fetch refused".into()));
        }
        self.inner.fetch()
    }

    fn push(&mut self, snapshot: Snapshot) -> FuseResult<()> {
        if self.fail_push.load(Ordering::SeqCst) {
            return Err(FuseError::StoreUnavailable("push refused".into()));
        }
        self.inner.push(snapshot)
    }
}
