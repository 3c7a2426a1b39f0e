use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::CounterName;

/// Authoritative counter cells: `name -> AtomicI64`.
///
/// An absent name reads as 0. Cells are created by `entry().or_insert_with`,
/// so when two callers race to create the same name exactly one cell survives
/// and both advance it.
#[derive(Debug, Default)]
pub struct CounterStore {
    cells: DashMap<String, AtomicI64>,
}

impl CounterStore {
    pub fn new() -> Self {
        Self {
            cells: DashMap::new(),
        }
    }

    /// Advance `name` by one and return the new value.
    pub fn increment(&self, name: &CounterName) -> i64 {
        self.increment_with(name, |_| {})
    }

    /// Advance `name` by one, handing the new value to `publish` while the
    /// cell is still pinned. A concurrent [`remove_with`](Self::remove_with)
    /// on the same name waits until `publish` returns.
    pub fn increment_with<F>(&self, name: &CounterName, publish: F) -> i64
    where
        F: FnOnce(i64),
    {
        // fast path: shard read lock only
        if let Some(cell) = self.cells.get(name.as_str()) {
            let value = cell.fetch_add(1, Ordering::AcqRel) + 1;
            publish(value);
            return value;
        }

        let cell = self
            .cells
            .entry(name.as_str().to_owned())
            .or_insert_with(|| AtomicI64::new(0));
        let value = cell.fetch_add(1, Ordering::AcqRel) + 1;
        publish(value);
        value
    }

    /// Drop the cell for `name`, running `evict` under the same shard lock.
    /// Returns whether a cell existed.
    pub fn remove_with<F>(&self, name: &CounterName, evict: F) -> bool
    where
        F: FnOnce(),
    {
        match self.cells.entry(name.as_str().to_owned()) {
            Entry::Occupied(e) => {
                evict();
                e.remove();
                true
            }
            Entry::Vacant(_) => {
                evict();
                false
            }
        }
    }

    /// Current value without advancing; 0 when absent.
    pub fn current(&self, name: &CounterName) -> i64 {
        self.cells
            .get(name.as_str())
            .map(|c| c.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    /// Materialized counters, sorted by name.
    pub fn snapshot(&self) -> Vec<(String, i64)> {
        let mut out: Vec<(String, i64)> = self
            .cells
            .iter()
            .map(|r| (r.key().clone(), r.value().load(Ordering::Acquire)))
            .collect();
        out.sort();
        out
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
