//! Snapshot synchronization
//!
//! The [`Synchronizer`] refreshes the session's snapshot from the identity
//! source. It is single-flight: while a fetch is outstanding every further
//! caller joins it and observes the same result, so overlapping requests
//! produce exactly one outbound call.
//!
//! A fetch is tied to the session epoch it started under. Logout, credential
//! eviction or a new sign-in bump the epoch, and a result arriving for an old
//! epoch is dropped instead of resurrecting a snapshot. Callers only join a
//! flight from their own epoch; after a new sign-in the next caller starts a
//! fresh fetch even while the old one is still outstanding.
//!
//! ```text
//! Idle ──force_sync──▶ Syncing ──▶ Idle (replaced | failed | rejected | discarded)
//!                        ▲
//!          force_sync ───┘ (joins, no second fetch)
//! ```

pub mod diagnostics;

pub use diagnostics::{SyncDiagnostics, SyncOutcome, SyncRecord, DEFAULT_DIAGNOSTICS_CAPACITY};

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::MetricsCollector;
use crate::error::AccessError;
use crate::session::SessionState;
use crate::snapshot::PermissionSnapshot;
use crate::source::IdentitySource;

/// Synchronizer state as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Idle,
    Syncing,
}

type Flight = Shared<BoxFuture<'static, bool>>;

struct InFlight {
    id: u64,
    /// Session epoch the fetch was started under
    epoch: u64,
    outcome: Flight,
}

#[derive(Clone)]
struct SyncContext {
    source: Arc<dyn IdentitySource>,
    state: Arc<RwLock<SessionState>>,
    slot: Arc<Mutex<Option<InFlight>>>,
    diagnostics: Arc<SyncDiagnostics>,
    metrics: Option<Arc<MetricsCollector>>,
}

/// Single-flight snapshot refresher
pub struct Synchronizer {
    ctx: SyncContext,
    next_flight: AtomicU64,
}

impl Synchronizer {
    pub(crate) fn new(
        source: Arc<dyn IdentitySource>,
        state: Arc<RwLock<SessionState>>,
        diagnostics: Arc<SyncDiagnostics>,
        metrics: Option<Arc<MetricsCollector>>,
    ) -> Self {
        Self {
            ctx: SyncContext {
                source,
                state,
                slot: Arc::new(Mutex::new(None)),
                diagnostics,
                metrics,
            },
            next_flight: AtomicU64::new(1),
        }
    }

    pub fn state(&self) -> SyncState {
        if self.ctx.slot.lock().is_some() {
            SyncState::Syncing
        } else {
            SyncState::Idle
        }
    }

    /// Refresh the snapshot; `true` when it was replaced.
    ///
    /// Never fails: errors are logged and recorded in the diagnostics ledger.
    /// Not gated by staleness; a fresh session simply re-fetches.
    pub async fn force_sync(&self) -> bool {
        let epoch = self.ctx.state.read().epoch;

        let (flight, joined) = {
            let mut slot = self.ctx.slot.lock();
            let joinable = slot
                .as_ref()
                .filter(|in_flight| in_flight.epoch == epoch)
                .map(|in_flight| in_flight.outcome.clone());

            match joinable {
                Some(outcome) => (outcome, true),
                None => {
                    // A flight from an ended session is left to finish and be discarded.
                    if let Some(stale) = slot.as_ref() {
                        debug!(flight = stale.id, epoch = stale.epoch, "in-flight sync belongs to an ended session");
                    }

                    let id = self.next_flight.fetch_add(1, Ordering::Relaxed);
                    let outcome = self.ctx.clone().run(id, epoch).boxed().shared();
                    *slot = Some(InFlight {
                        id,
                        epoch,
                        outcome: outcome.clone(),
                    });
                    (outcome, false)
                }
            }
        };

        if joined {
            debug!("joining in-flight snapshot sync");
            if let Some(metrics) = &self.ctx.metrics {
                metrics.record_sync_coalesced();
            }
        }

        flight.await
    }
}

impl SyncContext {
    async fn run(self, flight_id: u64, epoch: u64) -> bool {
        let outcome = self.attempt(epoch).await;

        // Back to Idle before the result is published to joined callers.
        let mut slot = self.slot.lock();
        if slot.as_ref().is_some_and(|flight| flight.id == flight_id) {
            *slot = None;
        }

        outcome.succeeded()
    }

    async fn attempt(&self, epoch: u64) -> SyncOutcome {
        let started = Instant::now();

        let credential = {
            let state = self.state.read();
            if state.epoch != epoch {
                drop(state);
                debug!(epoch, "session changed before snapshot sync started");
                return self.conclude(SyncOutcome::Discarded, None, started);
            }
            state.credential.clone()
        };

        let Some(credential) = credential.filter(|c| !c.is_blank()) else {
            debug!("snapshot sync skipped: no credential");
            return self.conclude(SyncOutcome::Skipped, Some(&AccessError::Unauthenticated), started);
        };

        if let Some(metrics) = &self.metrics {
            metrics.record_sync_started();
        }
        debug!(epoch, "snapshot sync started");

        let fetched = self
            .source
            .fetch_identity(&credential)
            .await
            .and_then(PermissionSnapshot::from_payload);

        let mut state = self.state.write();

        if state.epoch != epoch {
            drop(state);
            info!(epoch, "session changed during snapshot sync, result discarded");
            return self.conclude(SyncOutcome::Discarded, fetched.err().as_ref(), started);
        }

        match fetched {
            Ok(snapshot) => {
                let generation = snapshot.generation().value();
                let grants = snapshot.grants().len();
                let role = snapshot.role().name.clone();
                state.snapshot = Some(Arc::new(snapshot));
                drop(state);

                info!(generation, grants, role = %role, "permission snapshot replaced");
                self.conclude(SyncOutcome::Replaced, None, started)
            }
            Err(err) if err.is_credential_rejected() => {
                state.evict();
                drop(state);

                warn!(error = %err, "credential rejected, session torn down");
                self.conclude(SyncOutcome::Rejected, Some(&err), started)
            }
            Err(err) => {
                drop(state);

                warn!(error = %err, kind = ?err.kind(), "snapshot sync failed, keeping current snapshot");
                self.conclude(SyncOutcome::Failed, Some(&err), started)
            }
        }
    }

    fn conclude(&self, outcome: SyncOutcome, error: Option<&AccessError>, started: Instant) -> SyncOutcome {
        self.diagnostics
            .record(SyncRecord::new(outcome, error, started.elapsed()));

        if let Some(metrics) = &self.metrics {
            metrics.record_sync_outcome(outcome);
        }

        outcome
    }
}
