//! Text lane envelope and replies (JSON).

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::{ClientCode, Result, TallyError};

/// The only protocol version spoken.
pub const PROTOCOL_VERSION: u8 = 1;

/// Inbound text frame.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Envelope {
    /// Protocol version.
    pub v: u64,
    /// Service name (`counter`, `sys`).
    pub svc: String,
    /// Operation (field name is `type` in JSON).
    #[serde(rename = "type")]
    pub msg_type: String,
    /// Optional correlation id, echoed back in the reply.
    #[serde(default)]
    pub seq: Option<u64>,
    /// Counter name for `counter` operations.
    #[serde(default)]
    pub name: Option<String>,
}

impl Envelope {
    /// Decode and version-check a text frame.
    pub fn parse(s: &str) -> Result<Self> {
        let env: Envelope = serde_json::from_str(s)
            .map_err(|e| TallyError::BadRequest(format!("invalid envelope json: {e}")))?;
        if env.v != u64::from(PROTOCOL_VERSION) {
            return Err(TallyError::UnsupportedVersion);
        }
        Ok(env)
    }

    pub fn require_name(&self) -> Result<&str> {
        self.name.as_deref().ok_or_else(|| {
            TallyError::InvalidArgument(format!("{}.{} requires name", self.svc, self.msg_type))
        })
    }
}

/// Outbound text frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub v: u8,
    pub svc: String,
    #[serde(rename = "type")]
    pub msg_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Reply {
    fn new(svc: &str, msg_type: &str, seq: Option<u64>) -> Self {
        Self {
            v: PROTOCOL_VERSION,
            svc: svc.to_string(),
            msg_type: msg_type.to_string(),
            seq,
            name: None,
            data: None,
        }
    }

    pub fn value(seq: Option<u64>, name: &str, value: i64) -> Self {
        Self {
            name: Some(name.to_string()),
            data: Some(json!({ "value": value })),
            ..Self::new("counter", "value", seq)
        }
    }

    pub fn reset(seq: Option<u64>, name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Self::new("counter", "reset", seq)
        }
    }

    pub fn pong(seq: Option<u64>) -> Self {
        Self::new("sys", "pong", seq)
    }

    pub fn authed(user: &str) -> Self {
        Self {
            data: Some(json!({ "user": user })),
            ..Self::new("sys", "authed", None)
        }
    }

    pub fn error(seq: Option<u64>, code: ClientCode, msg: &str) -> Self {
        Self {
            data: Some(json!({ "code": code.as_str(), "msg": msg })),
            ..Self::new("sys", "error", seq)
        }
    }

    /// Error reply carrying the error's client code and message.
    pub fn from_error(seq: Option<u64>, err: &TallyError) -> Self {
        Self::error(seq, err.client_code(), &err.to_string())
    }

    /// Serialize for the wire.
    pub fn to_text(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| TallyError::Internal(format!("json encode failed: {e}")))
    }
}
