//! Wire shapes shared by the HTTP and WebSocket surfaces.
//!
//! - Text lane: JSON [`text::Envelope`] in, [`text::Reply`] out.
//! - HTTP: [`CounterView`] bodies.
//!
//! Parsers are panic-free: malformed input is reported as `TallyError`.

pub mod text;

use serde::{Deserialize, Serialize};

/// JSON body for a single counter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterView {
    pub name: String,
    pub value: i64,
}

impl CounterView {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

impl From<(String, i64)> for CounterView {
    fn from((name, value): (String, i64)) -> Self {
        Self { name, value }
    }
}
