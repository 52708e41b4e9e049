//! Decision memo keyed by snapshot and catalog generation

use dashmap::DashMap;
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

use super::decision::ModuleDecision;
use crate::types::{Generation, ModuleId};

/// Cache configuration
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Memoize decisions at all
    pub enabled: bool,

    /// Maximum number of memoized decisions
    pub capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            capacity: 1024,
        }
    }
}

/// Generation pair a set of memoized decisions belongs to
type GenerationKey = (Generation, Generation);

/// Cache key: snapshot generation, catalog generation, module
type CacheKey = (Generation, Generation, ModuleId);

struct Memo {
    /// Generation pair the entries were computed under
    current: Option<GenerationKey>,
    entries: LruCache<CacheKey, ModuleDecision>,
}

impl Memo {
    /// Drop everything when the generation pair changes; true if it did
    fn observe(&mut self, pair: GenerationKey) -> bool {
        match self.current {
            Some(existing) if existing == pair => false,
            Some(_) => {
                self.entries.clear();
                self.current = Some(pair);
                true
            }
            None => {
                self.current = Some(pair);
                false
            }
        }
    }
}

/// Memoized decisions for the current snapshot/catalog generation
///
/// Seeing a new generation pair drops every entry at once. Because the
/// generations are also part of each key, a reader racing a replacement can
/// never get a decision from an older snapshot. Within one generation the
/// least recently used decision is evicted at capacity.
pub struct DecisionCache {
    memo: Mutex<Memo>,

    config: CacheConfig,

    stats: Arc<DashMap<String, usize>>,
}

impl DecisionCache {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            memo: Mutex::new(Memo {
                current: None,
                entries: LruCache::new(capacity),
            }),
            config,
            stats: Arc::new(DashMap::new()),
        }
    }

    /// Get a memoized decision
    pub fn get(&self, snapshot: Generation, catalog: Generation, module: &ModuleId) -> Option<ModuleDecision> {
        let mut memo = self.memo.lock();
        if memo.observe((snapshot, catalog)) {
            self.increment_stat("invalidations");
        }

        let key = (snapshot, catalog, module.clone());
        match memo.entries.get(&key).copied() {
            Some(decision) => {
                self.increment_stat("hits");
                Some(decision)
            }
            None => {
                self.increment_stat("misses");
                None
            }
        }
    }

    /// Memoize a decision
    pub fn put(&self, snapshot: Generation, catalog: Generation, module: ModuleId, decision: ModuleDecision) {
        let mut memo = self.memo.lock();
        if memo.observe((snapshot, catalog)) {
            self.increment_stat("invalidations");
        }

        // push hands back the old entry on replace and the LRU entry on eviction
        let key = (snapshot, catalog, module);
        let displaced = memo.entries.push(key.clone(), decision);
        if displaced.is_some_and(|(old, _)| old != key) {
            self.increment_stat("evictions");
        }
    }

    /// Drop every memoized decision
    pub fn clear(&self) {
        let mut memo = self.memo.lock();
        memo.current = None;
        memo.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            invalidations: self.get_stat("invalidations"),
            evictions: self.get_stat("evictions"),
            entries: self.memo.lock().entries.len(),
            max_entries: self.config.capacity,
        }
    }

    fn increment_stat(&self, key: &str) {
        self.stats
            .entry(key.to_string())
            .and_modify(|count| *count += 1)
            .or_insert(1);
    }

    fn get_stat(&self, key: &str) -> usize {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub invalidations: usize,
    pub evictions: usize,
    pub entries: usize,
    pub max_entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
