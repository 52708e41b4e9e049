//! Counters for decisions and synchronization, with Prometheus text export

use parking_lot::RwLock;
use std::sync::Arc;

use super::decision::ModuleDecision;
use crate::sync::SyncOutcome;

/// Access subsystem counters
#[derive(Debug, Clone, Default)]
pub struct AccessMetrics {
    /// Decisions computed (cache misses that reached the evaluator)
    pub decisions_computed: u64,

    /// Computed decisions with at least one access flag set
    pub decisions_allowed: u64,

    /// Decisions answered while still loading
    pub decisions_loading: u64,

    pub cache_hits: u64,
    pub cache_misses: u64,

    /// Outbound syncs issued
    pub syncs_started: u64,

    /// Callers that joined an in-flight sync instead of starting one
    pub syncs_coalesced: u64,

    pub syncs_replaced: u64,
    pub syncs_failed: u64,
    pub syncs_rejected: u64,
    pub syncs_skipped: u64,
    pub syncs_discarded: u64,
}

impl AccessMetrics {
    pub fn cache_hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}

/// Metrics collector shared by the session and its synchronizer
pub struct MetricsCollector {
    metrics: Arc<RwLock<AccessMetrics>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            metrics: Arc::new(RwLock::new(AccessMetrics::default())),
        }
    }

    pub fn record_cache_hit(&self) {
        self.metrics.write().cache_hits += 1;
    }

    pub fn record_cache_miss(&self) {
        self.metrics.write().cache_misses += 1;
    }

    /// Record a freshly computed decision
    pub fn record_decision(&self, decision: &ModuleDecision) {
        let mut metrics = self.metrics.write();
        if decision.is_loading {
            metrics.decisions_loading += 1;
            return;
        }

        metrics.decisions_computed += 1;
        if decision.any() {
            metrics.decisions_allowed += 1;
        }
    }

    pub fn record_sync_started(&self) {
        self.metrics.write().syncs_started += 1;
    }

    pub fn record_sync_coalesced(&self) {
        self.metrics.write().syncs_coalesced += 1;
    }

    pub fn record_sync_outcome(&self, outcome: SyncOutcome) {
        let mut metrics = self.metrics.write();
        match outcome {
            SyncOutcome::Replaced => metrics.syncs_replaced += 1,
            SyncOutcome::Failed => metrics.syncs_failed += 1,
            SyncOutcome::Rejected => metrics.syncs_rejected += 1,
            SyncOutcome::Skipped => metrics.syncs_skipped += 1,
            SyncOutcome::Discarded => metrics.syncs_discarded += 1,
        }
    }

    pub fn get_metrics(&self) -> AccessMetrics {
        self.metrics.read().clone()
    }

    pub fn reset(&self) {
        *self.metrics.write() = AccessMetrics::default();
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let metrics = self.metrics.read();

        format!(
            r#"# HELP access_decisions_total Decisions computed by the evaluator
# TYPE access_decisions_total counter
access_decisions_total {}

# HELP access_decisions_allowed_total Computed decisions granting any access
# TYPE access_decisions_allowed_total counter
access_decisions_allowed_total {}

# HELP access_decisions_loading_total Decisions answered while loading
# TYPE access_decisions_loading_total counter
access_decisions_loading_total {}

# HELP access_cache_hits_total Decision cache hits
# TYPE access_cache_hits_total counter
access_cache_hits_total {}

# HELP access_cache_misses_total Decision cache misses
# TYPE access_cache_misses_total counter
access_cache_misses_total {}

# HELP access_syncs_started_total Outbound snapshot fetches
# TYPE access_syncs_started_total counter
access_syncs_started_total {}

# HELP access_syncs_coalesced_total Sync callers that joined an in-flight fetch
# TYPE access_syncs_coalesced_total counter
access_syncs_coalesced_total {}

# HELP access_sync_outcomes_total Sync outcomes by kind
# TYPE access_sync_outcomes_total counter
access_sync_outcomes_total{{outcome="replaced"}} {}
access_sync_outcomes_total{{outcome="failed"}} {}
access_sync_outcomes_total{{outcome="rejected"}} {}
access_sync_outcomes_total{{outcome="skipped"}} {}
access_sync_outcomes_total{{outcome="discarded"}} {}
"#,
            metrics.decisions_computed,
            metrics.decisions_allowed,
            metrics.decisions_loading,
            metrics.cache_hits,
            metrics.cache_misses,
            metrics.syncs_started,
            metrics.syncs_coalesced,
            metrics.syncs_replaced,
            metrics.syncs_failed,
            metrics.syncs_rejected,
            metrics.syncs_skipped,
            metrics.syncs_discarded,
        )
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_decisions() {
        let collector = MetricsCollector::new();

        collector.record_decision(&ModuleDecision::unrestricted());
        collector.record_decision(&ModuleDecision::denied());
        collector.record_decision(&ModuleDecision::loading());

        let metrics = collector.get_metrics();
        assert_eq!(metrics.decisions_computed, 2);
        assert_eq!(metrics.decisions_allowed, 1);
        assert_eq!(metrics.decisions_loading, 1);
    }

    #[test]
    fn test_record_cache() {
        let collector = MetricsCollector::new();

        collector.record_cache_hit();
        collector.record_cache_hit();
        collector.record_cache_miss();

        let metrics = collector.get_metrics();
        assert!((metrics.cache_hit_rate() - 0.666).abs() < 0.01);
    }

    #[test]
    fn test_record_sync_outcomes() {
        let collector = MetricsCollector::new();

        collector.record_sync_started();
        collector.record_sync_coalesced();
        collector.record_sync_outcome(SyncOutcome::Replaced);
        collector.record_sync_outcome(SyncOutcome::Failed);
        collector.record_sync_outcome(SyncOutcome::Discarded);

        let metrics = collector.get_metrics();
        assert_eq!(metrics.syncs_started, 1);
        assert_eq!(metrics.syncs_coalesced, 1);
        assert_eq!(metrics.syncs_replaced, 1);
        assert_eq!(metrics.syncs_failed, 1);
        assert_eq!(metrics.syncs_discarded, 1);
    }

    #[test]
    fn test_prometheus_export() {
        let collector = MetricsCollector::new();
        collector.record_sync_started();
        collector.record_sync_outcome(SyncOutcome::Replaced);

        let text = collector.export_prometheus();
        assert!(text.contains("access_syncs_started_total 1"));
        assert!(text.contains("access_sync_outcomes_total{outcome=\"replaced\"} 1"));
    }

    #[test]
    fn test_reset() {
        let collector = MetricsCollector::new();
        collector.record_cache_hit();
        collector.reset();
        assert_eq!(collector.get_metrics().cache_hits, 0);
    }
}
