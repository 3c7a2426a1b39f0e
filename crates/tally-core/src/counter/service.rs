use crate::error::Result;

use super::{CacheRegion, CacheStats, CounterName, CounterStore};

/// Name of the cache region counter values are published to.
pub const COUNTERS_REGION: &str = "Counters";

/// Named counters with explicit read-through, write-through and eviction.
///
/// Cache policy:
/// - `increment` always advances the store and publishes the new value.
/// - `get_cached` returns the published value when one exists (hit) and
///   otherwise falls through to `increment` (miss). Two concurrent misses
///   on the same name each advance the counter once.
/// - `reset` drops the cell and the published value together.
#[derive(Debug)]
pub struct NamedCounterCache {
    store: CounterStore,
    cache: CacheRegion,
}

impl Default for NamedCounterCache {
    fn default() -> Self {
        Self::new()
    }
}

impl NamedCounterCache {
    pub fn new() -> Self {
        Self {
            store: CounterStore::new(),
            cache: CacheRegion::new(COUNTERS_REGION),
        }
    }

    /// Read-through: cached value if present, else one increment.
    pub fn get_cached(&self, name: &str) -> Result<i64> {
        let name = CounterName::new(name)?;
        if let Some(value) = self.cache.lookup(name.as_str()) {
            tracing::debug!(counter = %name, value, "cache hit");
            return Ok(value);
        }
        tracing::debug!(counter = %name, "cache miss");
        Ok(self.advance(&name))
    }

    /// Write-through increment. Returns the new value.
    pub fn increment(&self, name: &str) -> Result<i64> {
        let name = CounterName::new(name)?;
        Ok(self.advance(&name))
    }

    /// Evict `name` from both store and cache. Absent names are a no-op.
    pub fn reset(&self, name: &str) -> Result<()> {
        let name = CounterName::new(name)?;
        let existed = self.store.remove_with(&name, || {
            self.cache.evict(name.as_str());
        });
        if existed {
            tracing::info!(counter = %name, region = self.cache.name(), "counter reset");
        }
        Ok(())
    }

    /// Store value without advancing it or touching cache statistics.
    pub fn current(&self, name: &str) -> Result<i64> {
        let name = CounterName::new(name)?;
        Ok(self.store.current(&name))
    }

    /// All materialized counters, sorted by name.
    pub fn snapshot(&self) -> Vec<(String, i64)> {
        self.store.snapshot()
    }

    pub fn stats(&self) -> CacheStats {
        self.cache.stats()
    }

    fn advance(&self, name: &CounterName) -> i64 {
        let value = self
            .store
            .increment_with(name, |v| self.cache.publish(name.as_str(), v));
        tracing::trace!(counter = %name, value, "counter incremented");
        value
    }
}
