//! Optional session-token authentication (§4.2, §4.8) and the IP-based
//! rate limiter that guards it. Grounded in the teacher's circuit-breaker
//! pattern in `state.rs`: atomics plus a single `RwLock` for the trip time.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

const MAX_FAILURES_PER_WINDOW: u32 = 5;
const WINDOW: Duration = Duration::from_secs(60);

struct IpState {
    failures: u32,
    window_start: Instant,
}

/// Advisory, server-side IP rate limiter for `authenticate_user`. The user
/// store (if configured) is responsible for its own per-user counting; this
/// limiter only protects against a single IP hammering the endpoint.
pub struct IpRateLimiter {
    state: RwLock<HashMap<String, IpState>>,
}

impl IpRateLimiter {
    pub fn new() -> Self {
        Self { state: RwLock::new(HashMap::new()) }
    }

    /// Returns `true` if the request from `ip` should be allowed through.
    pub async fn check(&self, ip: &str) -> bool {
        let mut state = self.state.write().await;
        let entry = state.entry(ip.to_string()).or_insert_with(|| IpState {
            failures: 0,
            window_start: Instant::now(),
        });
        if entry.window_start.elapsed() > WINDOW {
            entry.failures = 0;
            entry.window_start = Instant::now();
        }
        entry.failures < MAX_FAILURES_PER_WINDOW
    }

    pub async fn record_failure(&self, ip: &str) {
        let mut state = self.state.write().await;
        let entry = state.entry(ip.to_string()).or_insert_with(|| IpState {
            failures: 0,
            window_start: Instant::now(),
        });
        entry.failures += 1;
    }

    /// Successful authentication resets the IP's counter (§4.8).
    pub async fn record_success(&self, ip: &str) {
        self.state.write().await.remove(ip);
    }
}

impl Default for IpRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// A session token issued by `authenticate_user`.
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Backing store for username/password credentials. Not implemented by the
/// core — a deployment wires a concrete store (e.g. backed by its own
/// Postgres table) when it wants `authenticate_user` enabled at all.
#[async_trait::async_trait]
pub trait UserStore: Send + Sync {
    async fn validate_credentials(&self, username: &str, password: &str) -> bool;
}

pub fn issue_session_token(ttl: Duration) -> SessionToken {
    use rand::RngCore;
    let mut bytes = [0u8; 24];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    SessionToken {
        token: format!("sess_{}", hex::encode(bytes)),
        expires_at: Utc::now() + chrono::Duration::from_std(ttl).unwrap_or_default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_until_threshold_then_blocks() {
        let limiter = IpRateLimiter::new();
        for _ in 0..MAX_FAILURES_PER_WINDOW {
            assert!(limiter.check("1.2.3.4").await);
            limiter.record_failure("1.2.3.4").await;
        }
        assert!(!limiter.check("1.2.3.4").await);
    }

    #[tokio::test]
    async fn success_resets_counter() {
        let limiter = IpRateLimiter::new();
        for _ in 0..MAX_FAILURES_PER_WINDOW {
            limiter.record_failure("5.6.7.8").await;
        }
        assert!(!limiter.check("5.6.7.8").await);
        limiter.record_success("5.6.7.8").await;
        assert!(limiter.check("5.6.7.8").await);
    }
}
