//! Bounded cache of compiled flows.
//!
//! Compilation is pure and deterministic, so structurally identical
//! scenarios can share one compiled form. The cache is an explicit
//! object owned by whoever owns the runner — not a process-wide
//! singleton — and evicts least-recently-used entries beyond its
//! capacity, so repeated runs against changing graphs cannot grow it
//! without bound.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::collections::VecDeque;
use std::sync::Arc;

use super::compilation::CompiledFlow;
use super::scenario::Scenario;

/// LRU cache of compiled flows keyed by scenario fingerprint.
///
/// Safe for concurrent lookup-or-compile: two callers compiling the same
/// scenario at once both succeed, and one entry wins. Hits return the
/// same `Arc` identity, which is what makes reuse observable.
///
/// # Examples
///
/// ```
/// use chatweave::graphs::{CompileCache, Scenario, ScenarioNode};
/// use std::sync::Arc;
///
/// let cache = CompileCache::with_capacity(8);
/// let scenario = Scenario::new(
///     vec![ScenarioNode { id: "a".into(), ..Default::default() }],
///     vec![],
/// );
///
/// let first = cache.get_or_compile(&scenario);
/// let second = cache.get_or_compile(&scenario);
/// assert!(Arc::ptr_eq(&first, &second));
/// ```
#[derive(Debug)]
pub struct CompileCache {
    inner: Mutex<CacheInner>,
    capacity: usize,
}

#[derive(Debug, Default)]
struct CacheInner {
    entries: FxHashMap<u64, Arc<CompiledFlow>>,
    // Recency order, least-recently-used at the front.
    order: VecDeque<u64>,
}

impl CompileCache {
    /// Default number of compiled flows kept around.
    pub const DEFAULT_CAPACITY: usize = 64;

    /// Creates a cache with [`DEFAULT_CAPACITY`](Self::DEFAULT_CAPACITY).
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Creates a cache bounded to `capacity` entries (minimum 1).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(CacheInner::default()),
            capacity: capacity.max(1),
        }
    }

    /// The configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached flows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every cached flow.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.order.clear();
    }

    /// Returns the compiled form of `scenario`, compiling on miss.
    #[must_use]
    pub fn get_or_compile(&self, scenario: &Scenario) -> Arc<CompiledFlow> {
        let key = scenario.fingerprint();

        if let Some(flow) = self.touch(key) {
            tracing::debug!(key, "compile cache hit");
            return flow;
        }

        // Compile outside the lock; a concurrent duplicate is harmless
        // since the result is identical and the first insert wins.
        let compiled = Arc::new(CompiledFlow::compile(scenario));

        let mut inner = self.inner.lock();
        let flow = inner
            .entries
            .entry(key)
            .or_insert_with(|| compiled)
            .clone();
        inner.order.retain(|k| *k != key);
        inner.order.push_back(key);
        while inner.entries.len() > self.capacity {
            let Some(evicted) = inner.order.pop_front() else {
                break;
            };
            inner.entries.remove(&evicted);
            tracing::debug!(key = evicted, "evicted compiled flow");
        }
        flow
    }

    /// Looks up `key`, refreshing its recency on hit.
    fn touch(&self, key: u64) -> Option<Arc<CompiledFlow>> {
        let mut inner = self.inner.lock();
        let flow = inner.entries.get(&key).cloned()?;
        inner.order.retain(|k| *k != key);
        inner.order.push_back(key);
        Some(flow)
    }
}

impl Default for CompileCache {
    fn default() -> Self {
        Self::new()
    }
}
