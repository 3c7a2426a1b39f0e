//! Transport layer (HTTP + WebSocket).
//!
//! Both transports authenticate first and then call into the same counter
//! service.

pub mod codec;
pub mod http;
pub mod ws;
