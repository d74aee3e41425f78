//! Guarded execution.
//!
//! Wraps an operation with the usual fuse protocol: ask, run, report.
//!
//! # Design Decisions
//! - A fuse whose store cannot be read counts as open: the operation is not
//!   run and the store error is returned
//! - A failed report is logged but does not replace the operation's own
//!   result. The store error itself is counted once, by the fuse

use std::future::Future;

use thiserror::Error;

use crate::resilience::types::FuseError;
use crate::resilience::Fuse;

/// Why a guarded call did not yield the operation's value.
#[derive(Debug, Error)]
pub enum GuardError<E> {
    /// The fuse denied the call; the operation was not run.
    #[error("Fuse '{id}' is tripped")]
    Tripped { id: String },

    /// The fuse could not be consulted; the operation was not run.
    #[error("Fuse unavailable: {0}")]
    Fuse(FuseError),

    /// The operation ran and failed.
    #[error("Operation failed: {0}")]
    Inner(E),
}

impl<E> GuardError<E> {
    pub fn is_tripped(&self) -> bool {
        matches!(self, GuardError::Tripped { .. })
    }
}

fn admit<F: Fuse + ?Sized, E>(fuse: &F) -> Result<(), GuardError<E>> {
    match fuse.get_state() {
        Ok(true) => Ok(()),
        Ok(false) => Err(GuardError::Tripped {
            id: fuse.id().to_string(),
        }),
        Err(e) => Err(GuardError::Fuse(e)),
    }
}

fn report<F: Fuse + ?Sized>(fuse: &F, success: bool) {
    if let Err(e) = fuse.push_state(success) {
        tracing::warn!(fuse = %fuse.id(), success, error = %e, "Failed to report outcome");
    }
}

/// Run `op` if `fuse` allows it and report whether it succeeded.
pub fn call<F, T, E, Op>(fuse: &F, op: Op) -> Result<T, GuardError<E>>
where
    F: Fuse + ?Sized,
    Op: FnOnce() -> Result<T, E>,
{
    admit(fuse)?;
    let result = op();
    report(fuse, result.is_ok());
    result.map_err(GuardError::Inner)
}

/// Async variant of [`call`].
pub async fn call_async<F, T, E, Op, Fut>(fuse: &F, op: Op) -> Result<T, GuardError<E>>
where
    F: Fuse + ?Sized,
    Op: FnOnce() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    admit(fuse)?;
    let result = op().await;
    report(fuse, result.is_ok());
    result.map_err(GuardError::Inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FuseSettings;
    use crate::resilience::clock::ManualClock;
    use crate::resilience::store::SnapshotStore;
    use crate::resilience::types::{FuseResult, Snapshot};
    use crate::resilience::DecayingFuse;
    use metrics::{Counter, Gauge, Histogram, Key, KeyName, Metadata, Recorder, SharedString, Unit};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use std::time::UNIX_EPOCH;

    /// Counts increments of `polyfuse_store_errors_total`, ignores the rest.
    #[derive(Default)]
    struct StoreErrorRecorder {
        store_errors: Arc<AtomicU64>,
    }

    impl Recorder for StoreErrorRecorder {
        fn describe_counter(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_gauge(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}
        fn describe_histogram(&self, _: KeyName, _: Option<Unit>, _: SharedString) {}

        fn register_counter(&self, key: &Key, _: &Metadata<'_>) -> Counter {
            if key.name() == "polyfuse_store_errors_total" {
                Counter::from_arc(self.store_errors.clone())
            } else {
                Counter::noop()
            }
        }

        fn register_gauge(&self, _: &Key, _: &Metadata<'_>) -> Gauge {
            Gauge::noop()
        }

        fn register_histogram(&self, _: &Key, _: &Metadata<'_>) -> Histogram {
            Histogram::noop()
        }
    }

    /// Accepts the first push (from `get_state`), rejects every later one.
    struct RejectsReports {
        snapshot: Snapshot,
        pushes: usize,
    }

    impl SnapshotStore for RejectsReports {
        fn fetch(&mut self) -> FuseResult<Snapshot> {
            Ok(self.snapshot)
        }

        fn push(&mut self, snapshot: Snapshot) -> FuseResult<()> {
            self.pushes += 1;
            if self.pushes > 1 {
                return Err(FuseError::StoreUnavailable("read-only replica".into()));
            }
            self.snapshot = snapshot;
            Ok(())
        }
    }

    fn fuse(max_error: i64) -> DecayingFuse {
        let settings = FuseSettings {
            timeframe_secs: 10,
            max_error,
            ..FuseSettings::new("guarded")
        };
        DecayingFuse::builder(settings)
            .clock(Arc::new(ManualClock::new(UNIX_EPOCH)))
            .build()
            .unwrap()
    }

    #[test]
    fn test_success_is_reported() {
        let fuse = fuse(3);
        let value: Result<u32, GuardError<&str>> = call(&fuse, || Ok(7));
        assert_eq!(value.unwrap(), 7);

        let snapshot = fuse.snapshot().unwrap();
        assert_eq!(snapshot.request_count, 2.0);
        assert_eq!(snapshot.error_count, 0.0);
    }

    #[test]
    fn test_failures_trip_the_fuse() {
        let fuse = fuse(3);
        for _ in 0..3 {
            let err = call::<_, (), _, _>(&fuse, || Err("boom")).unwrap_err();
            assert!(matches!(err, GuardError::Inner("boom")));
        }

        let mut ran = false;
        let err = call::<_, (), &str, _>(&fuse, || {
            ran = true;
            Ok(())
        })
        .unwrap_err();
        assert!(err.is_tripped());
        assert!(!ran);
        assert_eq!(err.to_string(), "Fuse 'guarded' is tripped");
    }

    #[tokio::test]
    async fn test_async_call() {
        let fuse = fuse(1);
        let err = call_async::<_, (), _, _, _>(&fuse, || async { Err("timeout") })
            .await
            .unwrap_err();
        assert!(matches!(err, GuardError::Inner("timeout")));

        let err = call_async::<_, (), &str, _, _>(&fuse, || async { Ok(()) })
            .await
            .unwrap_err();
        assert!(err.is_tripped());
    }

    #[test]
    fn test_failed_report_counted_once() {
        let recorder = StoreErrorRecorder::default();
        let store = RejectsReports {
            snapshot: Snapshot::initial(UNIX_EPOCH),
            pushes: 0,
        };
        let fuse = DecayingFuse::builder(FuseSettings::new("replica"))
            .clock(Arc::new(ManualClock::new(UNIX_EPOCH)))
            .store(store)
            .build()
            .unwrap();

        let value = metrics::with_local_recorder(&recorder, || call::<_, u32, &str, _>(&fuse, || Ok(5)));
        assert_eq!(value.unwrap(), 5);
        assert_eq!(recorder.store_errors.load(Ordering::SeqCst), 1);
    }
}
