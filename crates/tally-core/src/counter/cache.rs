use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use serde::Serialize;

/// Point-in-time cache statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: u64,
}

/// A named cache region holding the last published value per counter.
///
/// Values only move forward within one counter lifetime: `publish` keeps the
/// larger of the cached and offered value, so concurrent writers landing out
/// of order never roll the entry back.
#[derive(Debug)]
pub struct CacheRegion {
    name: &'static str,
    entries: DashMap<String, i64>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheRegion {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Look up `key`, counting a hit or a miss.
    pub fn lookup(&self, key: &str) -> Option<i64> {
        match self.entries.get(key).map(|v| *v.value()) {
            Some(v) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(v)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Write-through entry point.
    pub fn publish(&self, key: &str, value: i64) {
        self.entries
            .entry(key.to_owned())
            .and_modify(|v| *v = (*v).max(value))
            .or_insert(value);
    }

    pub fn evict(&self, key: &str) -> Option<i64> {
        self.entries.remove(key).map(|(_, v)| v)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len() as u64,
        }
    }
}
