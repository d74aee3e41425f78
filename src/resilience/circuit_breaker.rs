//! Decaying circuit breaker.
//!
//! Unlike a Closed/Open/Half-Open state machine, this breaker has no
//! explicit states. Each decision recomputes request and error pressure from
//! a decaying snapshot, so a tripped fuse closes again on its own once the
//! counters drain below the limits.
//!
//! # Operations
//! ```text
//! get_state():  lock → fetch → decide → (allow) push decayed → unlock
//! push_state(): lock → fetch → update → push → unlock
//! ```
//!
//! # Design Decisions
//! - One mutex around the store covers the whole read-modify-write, so
//!   concurrent callers never lose updates
//! - Store errors are returned to the caller untouched, no retries
//! - Settings are validated when building; a zero timeframe is rejected
//!   instead of producing Inf/NaN rates

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::schema::FuseSettings;
use crate::config::validation::validate_settings;
use crate::observability::metrics;
use crate::resilience::clock::{Clock, SystemClock};
use crate::resilience::decision::{DecisionPolicy, DefaultDecision, DefaultUpdate, TripLimits, UpdatePolicy};
use crate::resilience::store::{MemoryStore, SnapshotStore};
use crate::resilience::types::{Decision, FuseError, FuseResult, Snapshot};
use crate::resilience::Fuse;

/// Builder wiring a [`DecayingFuse`] to its collaborators.
///
/// Anything not set falls back to the in-memory store, the system clock,
/// and the default decision/update policies.
pub struct FuseBuilder {
    settings: FuseSettings,
    store: Option<Box<dyn SnapshotStore>>,
    clock: Option<Arc<dyn Clock>>,
    decision: Option<Box<dyn DecisionPolicy>>,
    update: Option<Box<dyn UpdatePolicy>>,
}

impl FuseBuilder {
    pub fn new(settings: FuseSettings) -> Self {
        Self {
            settings,
            store: None,
            clock: None,
            decision: None,
            update: None,
        }
    }

    /// Use an external store. It is used as-is and not seeded.
    pub fn store(mut self, store: impl SnapshotStore + 'static) -> Self {
        self.store = Some(Box::new(store));
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn decision_policy(mut self, policy: impl DecisionPolicy + 'static) -> Self {
        self.decision = Some(Box::new(policy));
        self
    }

    pub fn update_policy(mut self, policy: impl UpdatePolicy + 'static) -> Self {
        self.update = Some(Box::new(policy));
        self
    }

    /// Normalize and validate settings, then build the fuse.
    pub fn build(self) -> FuseResult<DecayingFuse> {
        let settings = self.settings.normalized();
        validate_settings(&settings).map_err(FuseError::InvalidSettings)?;

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let store = self
            .store
            .unwrap_or_else(|| Box::new(MemoryStore::new(Snapshot::initial(clock.now()))));
        let limits = TripLimits::from_settings(&settings);

        tracing::info!(
            fuse = %settings.id,
            timeframe_secs = settings.timeframe_secs,
            max_request = settings.max_request,
            max_error = settings.max_error,
            error_rate = settings.error_rate,
            ramp_secs = settings.ramp_secs,
            "Fuse created"
        );

        Ok(DecayingFuse {
            settings,
            limits,
            store: Mutex::new(store),
            clock,
            decision: self.decision.unwrap_or_else(|| Box::new(DefaultDecision)),
            update: self.update.unwrap_or_else(|| Box::new(DefaultUpdate)),
        })
    }
}

/// A fuse whose request and error counters decay with wall-clock time.
pub struct DecayingFuse {
    settings: FuseSettings,
    limits: TripLimits,
    store: Mutex<Box<dyn SnapshotStore>>,
    clock: Arc<dyn Clock>,
    decision: Box<dyn DecisionPolicy>,
    update: Box<dyn UpdatePolicy>,
}

impl DecayingFuse {
    /// Build a fuse with default collaborators.
    pub fn new(settings: FuseSettings) -> FuseResult<Self> {
        FuseBuilder::new(settings).build()
    }

    pub fn builder(settings: FuseSettings) -> FuseBuilder {
        FuseBuilder::new(settings)
    }

    /// Normalized settings the fuse was built with.
    pub fn settings(&self) -> &FuseSettings {
        &self.settings
    }

    pub fn limits(&self) -> &TripLimits {
        &self.limits
    }

    /// Read the stored snapshot as-is, without decaying it.
    pub fn snapshot(&self) -> FuseResult<Snapshot> {
        let mut store = self.lock_store();
        self.fetch(&mut **store)
    }

    fn lock_store(&self) -> MutexGuard<'_, Box<dyn SnapshotStore>> {
        // Snapshots are replaced whole, so a panic elsewhere cannot leave
        // the store half written.
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn fetch(&self, store: &mut dyn SnapshotStore) -> FuseResult<Snapshot> {
        store.fetch().inspect_err(|e| {
            tracing::warn!(fuse = %self.settings.id, error = %e, "Failed to fetch fuse snapshot");
            metrics::record_store_error(&self.settings.id, "fetch");
        })
    }

    fn push(&self, store: &mut dyn SnapshotStore, snapshot: Snapshot) -> FuseResult<()> {
        store.push(snapshot).inspect_err(|e| {
            tracing::warn!(fuse = %self.settings.id, error = %e, "Failed to push fuse snapshot");
            metrics::record_store_error(&self.settings.id, "push");
        })?;
        metrics::record_levels(&self.settings.id, &snapshot);
        Ok(())
    }
}

impl Fuse for DecayingFuse {
    fn id(&self) -> &str {
        &self.settings.id
    }

    fn get_state(&self) -> FuseResult<bool> {
        let mut store = self.lock_store();
        let snapshot = self.fetch(&mut **store)?;
        let now = self.clock.now();

        let decision = self.decision.decide(&snapshot, now, &self.limits);
        metrics::record_decision(&self.settings.id, decision.is_allowed());

        match decision {
            Decision::Allow(decayed) => {
                tracing::debug!(
                    fuse = %self.settings.id,
                    request = decayed.request_count,
                    error = decayed.error_count,
                    "Fuse allowed"
                );
                self.push(&mut **store, decayed)?;
                Ok(true)
            }
            Decision::Trip(reason) => {
                tracing::warn!(
                    fuse = %self.settings.id,
                    reason = reason.as_str(),
                    stored_request = snapshot.request_count,
                    stored_error = snapshot.error_count,
                    "Fuse tripped"
                );
                metrics::record_trip(&self.settings.id, reason);
                Ok(false)
            }
        }
    }

    fn push_state(&self, success: bool) -> FuseResult<()> {
        let mut store = self.lock_store();
        let snapshot = self.fetch(&mut **store)?;
        let now = self.clock.now();

        let updated = self.update.update(success, &snapshot, now, &self.limits);
        self.push(&mut **store, updated)?;
        metrics::record_outcome(&self.settings.id, success);

        tracing::debug!(
            fuse = %self.settings.id,
            success,
            request = updated.request_count,
            error = updated.error_count,
            "Fuse outcome recorded"
        );
        Ok(())
    }
}

impl fmt::Debug for DecayingFuse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecayingFuse")
            .field("settings", &self.settings)
            .field("limits", &self.limits)
            .finish_non_exhaustive()
    }
}
