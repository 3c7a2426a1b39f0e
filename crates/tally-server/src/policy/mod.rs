//! Policy layer (frame limits, name limits, rate limiting).
//!
//! Everything here runs before a request reaches the counter cache.

pub mod engine;

pub use engine::{check_name_len, ConnectionPolicy, PolicyDecision, SharedRateLimiter};
