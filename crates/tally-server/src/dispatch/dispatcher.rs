use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use tally_core::error::{Result, TallyError};
use tally_core::protocol::text::{Envelope, Reply};

/// Who sent a frame and over which transport.
#[derive(Debug, Clone)]
pub struct RequestCtx {
    pub user: Arc<str>,
    pub transport: &'static str,
}

impl RequestCtx {
    pub fn new(user: impl Into<Arc<str>>, transport: &'static str) -> Self {
        Self {
            user: user.into(),
            transport,
        }
    }
}

/// Text lane service keyed by the envelope's `svc`.
#[async_trait]
pub trait TextService: Send + Sync {
    fn svc(&self) -> &'static str;
    async fn handle(&self, ctx: &RequestCtx, env: &Envelope) -> Result<Reply>;
}

/// Registry and dispatcher for text services.
#[derive(Default)]
pub struct Dispatcher {
    text: DashMap<&'static str, Arc<dyn TextService>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            text: DashMap::new(),
        }
    }

    pub fn register_text(&self, svc: Arc<dyn TextService>) {
        self.text.insert(svc.svc(), svc);
    }

    pub fn registered_text_svcs(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = self.text.iter().map(|e| *e.key()).collect();
        out.sort_unstable();
        out
    }

    pub async fn dispatch_text(&self, ctx: &RequestCtx, env: &Envelope) -> Result<Reply> {
        let svc = env.svc.as_str();
        // clone out so the shard guard is not held across the await
        let handler = self
            .text
            .get(svc)
            .ok_or_else(|| TallyError::BadRequest(format!("unknown svc: {svc}")))?
            .value()
            .clone();
        handler.handle(ctx, env).await
    }
}
