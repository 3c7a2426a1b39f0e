use std::sync::Mutex;
use std::time::{Duration, Instant};

use tally_core::error::{ClientCode, Result, TallyError};

use crate::config::Limits;

/// Decision from policy evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyDecision {
    Pass,
    Reject { code: ClientCode, msg: &'static str },
    Close { code: ClientCode, msg: &'static str },
}

/// Per-connection policy for the text lane. Owned by one session task.
#[derive(Debug)]
pub struct ConnectionPolicy {
    max_frame_bytes: usize,
    limiter: ConnRateLimiter,
}

impl ConnectionPolicy {
    pub fn new(limits: &Limits) -> Self {
        Self {
            max_frame_bytes: limits.max_frame_bytes,
            limiter: ConnRateLimiter::new(limits.rate_limit_rps, limits.rate_limit_burst),
        }
    }

    /// Cheap checks run before a frame is decoded.
    pub fn check_frame(&mut self, bytes_len: usize) -> PolicyDecision {
        if bytes_len > self.max_frame_bytes {
            return PolicyDecision::Close {
                code: ClientCode::PayloadTooLarge,
                msg: "frame too large",
            };
        }
        if !self.limiter.allow() {
            return PolicyDecision::Reject {
                code: ClientCode::RateLimited,
                msg: "rate limited",
            };
        }
        PolicyDecision::Pass
    }
}

/// Counter names longer than `max_len` bytes are refused at the edge.
pub fn check_name_len(name: &str, max_len: usize) -> Result<()> {
    if name.len() > max_len {
        return Err(TallyError::InvalidArgument(format!(
            "counter name exceeds {max_len} bytes"
        )));
    }
    Ok(())
}

/// Per-connection token bucket (no mutex).
#[derive(Debug)]
pub struct ConnRateLimiter {
    bucket: TokenBucket,
}

impl ConnRateLimiter {
    pub fn new(rps: u32, burst: u32) -> Self {
        Self {
            bucket: TokenBucket::new(rps, burst),
        }
    }

    pub fn allow(&mut self) -> bool {
        self.bucket.allow()
    }
}

/// Token bucket shared by all HTTP callers.
#[derive(Debug)]
pub struct SharedRateLimiter {
    inner: Mutex<TokenBucket>,
}

impl SharedRateLimiter {
    pub fn new(rps: u32, burst: u32) -> Self {
        Self {
            inner: Mutex::new(TokenBucket::new(rps, burst)),
        }
    }

    pub fn check(&self) -> Result<()> {
        // Poisoned mutex means a logic bug; deny instead of panicking.
        let allowed = match self.inner.lock() {
            Ok(mut g) => g.allow(),
            Err(_) => false,
        };
        if allowed {
            Ok(())
        } else {
            Err(TallyError::RateLimited)
        }
    }
}

#[derive(Debug)]
struct TokenBucket {
    rps: u32,
    capacity: u32,
    tokens: u32,
    last: Instant,
}

impl TokenBucket {
    fn new(rps: u32, burst: u32) -> Self {
        let capacity = burst.max(1);
        Self {
            rps: rps.max(1),
            capacity,
            tokens: capacity,
            last: Instant::now(),
        }
    }

    fn allow(&mut self) -> bool {
        self.refill();
        if self.tokens == 0 {
            return false;
        }
        self.tokens -= 1;
        true
    }

    fn refill(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last);
        if elapsed < Duration::from_millis(50) {
            return;
        }

        let add = (elapsed.as_millis() as u64 * self.rps as u64 / 1000).min(u32::MAX as u64) as u32;
        if add > 0 {
            self.tokens = self.tokens.saturating_add(add).min(self.capacity);
            self.last = now;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_frame_bytes: usize, burst: u32) -> Limits {
        Limits {
            max_frame_bytes,
            max_name_len: 8,
            rate_limit_rps: 1,
            rate_limit_burst: burst,
        }
    }

    #[test]
    fn oversized_frame_closes() {
        let mut p = ConnectionPolicy::new(&limits(16, 10));
        assert_eq!(p.check_frame(16), PolicyDecision::Pass);
        assert!(matches!(
            p.check_frame(17),
            PolicyDecision::Close { code: ClientCode::PayloadTooLarge, .. }
        ));
    }

    #[test]
    fn burst_exhaustion_rejects() {
        let mut p = ConnectionPolicy::new(&limits(1024, 2));
        assert_eq!(p.check_frame(1), PolicyDecision::Pass);
        assert_eq!(p.check_frame(1), PolicyDecision::Pass);
        assert!(matches!(
            p.check_frame(1),
            PolicyDecision::Reject { code: ClientCode::RateLimited, .. }
        ));
    }

    #[test]
    fn shared_limiter_reports_rate_limited() {
        let lim = SharedRateLimiter::new(1, 1);
        assert!(lim.check().is_ok());
        assert!(matches!(lim.check(), Err(TallyError::RateLimited)));
    }

    #[test]
    fn long_names_are_invalid() {
        assert!(check_name_len("12345678", 8).is_ok());
        let err = check_name_len("123456789", 8).unwrap_err();
        assert_eq!(err.client_code(), ClientCode::InvalidArgument);
    }
}
