//! Bounded ledger of synchronization outcomes
//!
//! `force_sync` only ever reports a boolean; the cause of every failure is kept
//! here (and logged) so it is not lost.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::VecDeque;
use std::time::Duration;

use crate::error::{AccessError, FailureKind};

/// Default number of records kept
pub const DEFAULT_DIAGNOSTICS_CAPACITY: usize = 32;

/// How a sync attempt ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Snapshot replaced with the fetched one
    Replaced,
    /// Transport, status or payload failure; snapshot untouched
    Failed,
    /// Backend rejected the credential; credential and snapshot evicted
    Rejected,
    /// No credential, nothing fetched
    Skipped,
    /// Session was torn down or re-keyed while fetching; result dropped
    Discarded,
}

impl SyncOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, Self::Replaced)
    }
}

/// One sync attempt
#[derive(Debug, Clone, Serialize)]
pub struct SyncRecord {
    pub at: DateTime<Utc>,
    pub outcome: SyncOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
    pub elapsed_ms: u64,
}

impl SyncRecord {
    pub fn new(outcome: SyncOutcome, error: Option<&AccessError>, elapsed: Duration) -> Self {
        Self {
            at: Utc::now(),
            outcome,
            failure: error.map(AccessError::kind),
            cause: error.map(ToString::to_string),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// Ring buffer of recent sync records
pub struct SyncDiagnostics {
    records: Mutex<VecDeque<SyncRecord>>,
    capacity: usize,
}

impl SyncDiagnostics {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            records: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
        }
    }

    pub fn record(&self, record: SyncRecord) {
        let mut records = self.records.lock();
        if records.len() == self.capacity {
            records.pop_front();
        }
        records.push_back(record);
    }

    /// Records, oldest first
    pub fn records(&self) -> Vec<SyncRecord> {
        self.records.lock().iter().cloned().collect()
    }

    pub fn last(&self) -> Option<SyncRecord> {
        self.records.lock().back().cloned()
    }

    /// Most recent record that carries an error
    pub fn last_failure(&self) -> Option<SyncRecord> {
        self.records
            .lock()
            .iter()
            .rev()
            .find(|record| record.failure.is_some())
            .cloned()
    }

    pub fn clear(&self) {
        self.records.lock().clear();
    }
}

impl Default for SyncDiagnostics {
    fn default() -> Self {
        Self::new(DEFAULT_DIAGNOSTICS_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let diagnostics = SyncDiagnostics::new(2);

        diagnostics.record(SyncRecord::new(SyncOutcome::Skipped, None, Duration::ZERO));
        diagnostics.record(SyncRecord::new(SyncOutcome::Replaced, None, Duration::ZERO));
        diagnostics.record(SyncRecord::new(SyncOutcome::Replaced, None, Duration::ZERO));

        let records = diagnostics.records();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.outcome == SyncOutcome::Replaced));
    }

    #[test]
    fn test_last_failure_keeps_cause() {
        let diagnostics = SyncDiagnostics::default();
        let err = AccessError::Status {
            code: 500,
            message: "boom".into(),
        };

        diagnostics.record(SyncRecord::new(SyncOutcome::Failed, Some(&err), Duration::from_millis(12)));
        diagnostics.record(SyncRecord::new(SyncOutcome::Replaced, None, Duration::ZERO));

        let failure = diagnostics.last_failure().unwrap();
        assert_eq!(failure.outcome, SyncOutcome::Failed);
        assert_eq!(failure.failure, Some(FailureKind::SyncFailure));
        assert!(failure.cause.unwrap().contains("500"));
        assert_eq!(failure.elapsed_ms, 12);
        assert_eq!(diagnostics.last().unwrap().outcome, SyncOutcome::Replaced);
    }
}
