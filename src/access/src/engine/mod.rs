//! Decision engine
//!
//! Composes the catalog resolver and the evaluator into per-module decisions,
//! memoized per snapshot/catalog generation.
//!
//! ```text
//! name or id → CatalogResolver → ModuleId → evaluator → ModuleDecision
//!                                   ↓                        ↓
//!                     [DecisionCache keyed by generations]  [Metrics]
//! ```

pub mod cache;
pub mod decision;
pub mod evaluator;
pub mod metrics;

pub use cache::{CacheConfig, CacheStats, DecisionCache};
pub use decision::{DecisionBasis, ModuleDecision};
pub use evaluator::{decide, evaluate, is_admin};
pub use metrics::{AccessMetrics, MetricsCollector};

use std::sync::Arc;
use tracing::trace;

use crate::catalog::CatalogResolver;
use crate::snapshot::PermissionSnapshot;
use crate::types::ModuleDescriptor;

/// Session state a decision is computed from
#[derive(Debug, Clone, Copy)]
pub struct DecisionInputs<'a> {
    pub snapshot: Option<&'a PermissionSnapshot>,
    pub catalog: &'a CatalogResolver,

    /// A credential is held; without one nothing is ever loading
    pub authenticated: bool,
}

impl DecisionInputs<'_> {
    /// Snapshot or catalog has not completed its first load
    pub fn is_loading(&self) -> bool {
        self.authenticated && (self.snapshot.is_none() || !self.catalog.is_settled())
    }
}

/// Memoized per-module decision view
pub struct DecisionView {
    cache: Option<DecisionCache>,
    metrics: Option<Arc<MetricsCollector>>,
}

impl DecisionView {
    pub fn new(cache_config: CacheConfig, metrics: Option<Arc<MetricsCollector>>) -> Self {
        let cache = cache_config
            .enabled
            .then(|| DecisionCache::new(cache_config));

        Self { cache, metrics }
    }

    /// Decision for a module given by name or id
    pub fn decide(&self, inputs: &DecisionInputs<'_>, name_or_id: &str) -> ModuleDecision {
        let generations = match (inputs.is_loading(), inputs.snapshot) {
            (false, Some(snapshot)) => Some((snapshot.generation(), inputs.catalog.generation())),
            _ => None,
        };

        let module_id = inputs.catalog.module_key(name_or_id);

        if let (Some(cache), Some((snap_gen, cat_gen))) = (&self.cache, generations) {
            if let Some(decision) = cache.get(snap_gen, cat_gen, &module_id) {
                if let Some(metrics) = &self.metrics {
                    metrics.record_cache_hit();
                }
                return decision;
            }

            if let Some(metrics) = &self.metrics {
                metrics.record_cache_miss();
            }
        }

        let (decision, basis) = self.explain(inputs, name_or_id);
        trace!(module = %module_id, ?basis, "decision computed");

        if let Some(metrics) = &self.metrics {
            metrics.record_decision(&decision);
        }

        if let (Some(cache), Some((snap_gen, cat_gen))) = (&self.cache, generations) {
            cache.put(snap_gen, cat_gen, module_id, decision);
        }

        decision
    }

    /// Compute a decision and the rule behind it, bypassing the memo
    pub fn explain(&self, inputs: &DecisionInputs<'_>, name_or_id: &str) -> (ModuleDecision, DecisionBasis) {
        if inputs.is_loading() {
            return (ModuleDecision::loading(), DecisionBasis::Loading);
        }

        let module_id = inputs.catalog.module_key(name_or_id);
        let (decision, basis) = evaluate(inputs.snapshot, &module_id);

        // A grant only counts for modules the catalog knows about.
        if basis == DecisionBasis::Grant && !inputs.catalog.contains_id(&module_id) {
            return (ModuleDecision::denied(), DecisionBasis::UnknownModule);
        }

        (decision, basis)
    }

    /// Decision for every catalog module, in catalog order
    pub fn decide_all(&self, inputs: &DecisionInputs<'_>) -> Vec<(ModuleDescriptor, ModuleDecision)> {
        inputs
            .catalog
            .modules()
            .iter()
            .map(|module| (module.clone(), self.decide(inputs, module.id.as_str())))
            .collect()
    }

    /// Drop all memoized decisions
    pub fn invalidate(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(DecisionCache::stats)
    }
}
