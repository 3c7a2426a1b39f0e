//! Shared application state for the tally server.
//!
//! Wires the counter cache, authenticator, dispatcher and metrics together.
//! Startup errors are returned, never panicked on.

use std::sync::Arc;

use axum::http::HeaderMap;

use tally_core::credentials::{CredentialProvider, TestCredentialProvider};
use tally_core::error::Result;
use tally_core::NamedCounterCache;

use crate::auth::Authenticator;
use crate::config::ServerConfig;
use crate::dispatch::{Dispatcher, TextService};
use crate::obs::ServerMetrics;
use crate::policy::SharedRateLimiter;
use crate::services::{CounterService, SysService};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    counters: Arc<CounterService>,
    dispatcher: Arc<Dispatcher>,
    metrics: Arc<ServerMetrics>,
}

struct AppStateInner {
    cfg: ServerConfig,
    auth: Authenticator,
    http_limiter: SharedRateLimiter,
}

impl AppState {
    /// Build state using the fixed test credential provider.
    pub fn new(cfg: ServerConfig) -> Result<Self> {
        Self::with_provider(cfg, &TestCredentialProvider::new())
    }

    pub fn with_provider(cfg: ServerConfig, provider: &dyn CredentialProvider) -> Result<Self> {
        let auth = Authenticator::from_config(&cfg.security, provider)?;
        let http_limiter =
            SharedRateLimiter::new(cfg.limits.rate_limit_rps, cfg.limits.rate_limit_burst);

        let metrics = Arc::new(ServerMetrics::default());
        let cache = Arc::new(NamedCounterCache::new());
        let counters = Arc::new(CounterService::new(
            cache,
            Arc::clone(&metrics),
            cfg.limits.max_name_len,
        ));

        let dispatcher = Dispatcher::new();
        let counter_svc: Arc<dyn TextService> = counters.clone();
        dispatcher.register_text(counter_svc);
        dispatcher.register_text(Arc::new(SysService::new()));
        tracing::debug!(svcs = ?dispatcher.registered_text_svcs(), "text services registered");

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                auth,
                http_limiter,
            }),
            counters,
            dispatcher: Arc::new(dispatcher),
            metrics,
        })
    }

    pub fn cfg(&self) -> &ServerConfig {
        &self.inner.cfg
    }

    /// Verify request headers; rejections are counted per transport.
    pub fn authenticate(&self, headers: &HeaderMap, transport: &'static str) -> Result<String> {
        self.inner.auth.verify_headers(headers).inspect_err(|e| {
            self.metrics.auth_rejections.inc(&[("transport", transport)]);
            tracing::warn!(transport, error = %e, "authentication rejected");
        })
    }

    /// Shared HTTP rate limit.
    pub fn check_http_rate(&self) -> Result<()> {
        self.inner.http_limiter.check()
    }

    pub fn counters(&self) -> &CounterService {
        &self.counters
    }

    pub fn dispatcher(&self) -> Arc<Dispatcher> {
        Arc::clone(&self.dispatcher)
    }

    pub fn metrics(&self) -> &ServerMetrics {
        &self.metrics
    }

    pub fn is_draining(&self) -> bool {
        self.metrics.is_draining()
    }

    /// Cache statistics rendered alongside the registry.
    pub fn metrics_extra(&self) -> Vec<(&'static str, u64)> {
        let stats = self.counters.cache().stats();
        vec![
            ("tally_cache_hits_total", stats.hits),
            ("tally_cache_misses_total", stats.misses),
            ("tally_cache_entries", stats.entries),
        ]
    }
}
