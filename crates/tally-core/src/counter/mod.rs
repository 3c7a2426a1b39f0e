//! Named-counter cache.
//!
//! Two pieces cooperate here:
//! - [`CounterStore`]: the authoritative `name -> atomic cell` map. Cells are
//!   created with a single insert-if-absent and only ever advanced by one.
//! - [`CacheRegion`]: the "Counters" cache holding the last value published
//!   for each name, with hit/miss accounting.
//!
//! [`NamedCounterCache`] wires them together with explicit read-through,
//! write-through and evict calls.

mod cache;
mod name;
mod service;
mod store;

pub use cache::{CacheRegion, CacheStats};
pub use name::CounterName;
pub use service::{NamedCounterCache, COUNTERS_REGION};
pub use store::CounterStore;
