use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;

use tally_core::error::{Result, TallyError};
use tally_core::protocol::text::{Envelope, Reply};
use tally_core::NamedCounterCache;

use crate::dispatch::{RequestCtx, TextService};
use crate::obs::ServerMetrics;
use crate::policy::check_name_len;

/// Operations on a single named counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterOp {
    /// Read-through.
    Get,
    /// Write-through increment.
    Incr,
    /// Evict.
    Reset,
    /// Store value, never advances.
    Peek,
}

impl CounterOp {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "get" => Ok(CounterOp::Get),
            "incr" => Ok(CounterOp::Incr),
            "reset" => Ok(CounterOp::Reset),
            "peek" => Ok(CounterOp::Peek),
            other => Err(TallyError::BadRequest(format!("unknown counter op: {other}"))),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CounterOp::Get => "get",
            CounterOp::Incr => "incr",
            CounterOp::Reset => "reset",
            CounterOp::Peek => "peek",
        }
    }
}

/// Front door to the counter cache shared by the HTTP and WS transports.
pub struct CounterService {
    cache: Arc<NamedCounterCache>,
    metrics: Arc<ServerMetrics>,
    max_name_len: usize,
}

impl CounterService {
    pub fn new(
        cache: Arc<NamedCounterCache>,
        metrics: Arc<ServerMetrics>,
        max_name_len: usize,
    ) -> Self {
        Self {
            cache,
            metrics,
            max_name_len,
        }
    }

    pub fn cache(&self) -> &NamedCounterCache {
        &self.cache
    }

    /// Run `op` on `name`. `Reset` yields `None`, every other op the value.
    pub fn execute(&self, ctx: &RequestCtx, op: CounterOp, name: &str) -> Result<Option<i64>> {
        let started = Instant::now();
        let res = self.run(op, name);

        let outcome = match &res {
            Ok(_) => "ok",
            Err(e) => e.client_code().as_str(),
        };
        self.metrics.requests.inc(&[
            ("op", op.as_str()),
            ("transport", ctx.transport),
            ("outcome", outcome),
        ]);
        self.metrics
            .op_duration
            .observe(&[("op", op.as_str())], started.elapsed());

        if let Err(e) = &res {
            tracing::debug!(
                user = %ctx.user,
                op = op.as_str(),
                counter = %name,
                error = %e,
                "counter op failed"
            );
        }
        res
    }

    fn run(&self, op: CounterOp, name: &str) -> Result<Option<i64>> {
        check_name_len(name, self.max_name_len)?;
        match op {
            CounterOp::Get => self.cache.get_cached(name).map(Some),
            CounterOp::Incr => self.cache.increment(name).map(Some),
            CounterOp::Peek => self.cache.current(name).map(Some),
            CounterOp::Reset => self.cache.reset(name).map(|()| None),
        }
    }
}

#[async_trait]
impl TextService for CounterService {
    fn svc(&self) -> &'static str {
        "counter"
    }

    async fn handle(&self, ctx: &RequestCtx, env: &Envelope) -> Result<Reply> {
        let op = CounterOp::parse(&env.msg_type)?;
        let name = env.require_name()?;
        match self.execute(ctx, op, name)? {
            Some(value) => Ok(Reply::value(env.seq, name, value)),
            None => Ok(Reply::reset(env.seq, name)),
        }
    }
}
