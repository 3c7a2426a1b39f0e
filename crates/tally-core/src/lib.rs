//! tally core: the named-counter cache, credential contract, wire protocol,
//! and error types.
//!
//! This crate carries no transport or runtime dependencies so the counter
//! cache can be embedded directly or exposed by `tally-server`.
//!
//! # Defensive guarantees
//! Panics, `unwrap`, and `expect` are compile-denied here
//! (`#![deny(clippy::panic, clippy::unwrap_used, clippy::expect_used)]`).
//! All fallible paths surface as `TallyError`/`Result`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod counter;
pub mod credentials;
pub mod error;
pub mod protocol;

/// Shared result type.
pub use error::{Result, TallyError};

pub use counter::{CacheStats, CounterName, NamedCounterCache};
