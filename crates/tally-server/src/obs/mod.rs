//! Lightweight in-process metrics.
//!
//! Series are stored as atomics and rendered in Prometheus text format by the
//! `/metrics` handler.

pub mod metrics;

pub use metrics::ServerMetrics;
