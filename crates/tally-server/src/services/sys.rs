use async_trait::async_trait;

use tally_core::error::{Result, TallyError};
use tally_core::protocol::text::{Envelope, Reply};

use crate::dispatch::{RequestCtx, TextService};

/// Session-level housekeeping (`sys.ping`).
#[derive(Debug, Default)]
pub struct SysService;

impl SysService {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl TextService for SysService {
    fn svc(&self) -> &'static str {
        "sys"
    }

    async fn handle(&self, _ctx: &RequestCtx, env: &Envelope) -> Result<Reply> {
        match env.msg_type.as_str() {
            "ping" => Ok(Reply::pong(env.seq)),
            other => Err(TallyError::BadRequest(format!("unknown sys type: {other}"))),
        }
    }
}
