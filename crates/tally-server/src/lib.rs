//! tally server library entry.
//!
//! Exposes the named-counter cache over HTTP and a WebSocket text lane. Every
//! request is authenticated before it reaches the cache. Consumed by the
//! binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod auth;
pub mod config;
pub mod dispatch;
pub mod obs;
pub mod ops;
pub mod policy;
pub mod router;
pub mod services;
pub mod transport;
