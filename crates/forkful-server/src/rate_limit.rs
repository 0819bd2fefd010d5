//! Per-IP token buckets guarding the credential endpoints.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use tracing::warn;

use crate::error::ServerError;

#[derive(Debug, Clone)]
struct TokenBucket {
    tokens: f64,
    last_refill: Instant,
}

impl TokenBucket {
    fn new(capacity: f64) -> Self {
        Self {
            tokens: capacity,
            last_refill: Instant::now(),
        }
    }

    fn try_consume(&mut self, rate: f64, capacity: f64) -> bool {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_refill).as_secs_f64();
        self.last_refill = now;

        self.tokens = (self.tokens + elapsed * rate).min(capacity);
        if self.tokens < 1.0 {
            return false;
        }
        self.tokens -= 1.0;
        true
    }
}

#[derive(Clone)]
pub struct RateLimiter {
    buckets: Arc<Mutex<HashMap<IpAddr, TokenBucket>>>,
    rate: f64,
    capacity: f64,
}

impl RateLimiter {
    /// `rate` tokens per second, at most `capacity` banked.
    pub fn new(rate: f64, capacity: f64) -> Self {
        Self {
            buckets: Arc::new(Mutex::new(HashMap::new())),
            rate,
            capacity,
        }
    }

    pub async fn check(&self, ip: IpAddr) -> bool {
        let mut buckets = self.buckets.lock().await;
        buckets
            .entry(ip)
            .or_insert_with(|| TokenBucket::new(self.capacity))
            .try_consume(self.rate, self.capacity)
    }

    /// Drop buckets untouched for `max_idle_secs`.
    pub async fn purge_stale(&self, max_idle_secs: f64) {
        let now = Instant::now();
        self.buckets
            .lock()
            .await
            .retain(|_, b| now.duration_since(b.last_refill).as_secs_f64() < max_idle_secs);
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    if let Some(ip) = client_ip(&req) {
        if !limiter.check(ip).await {
            warn!(ip = %ip, path = %req.uri().path(), "Credential endpoint rate limit exceeded");
            return ServerError::RateLimited.into_response();
        }
    }
    next.run(req).await
}

/// Peer address first, then `X-Forwarded-For`, then `X-Real-IP`.
fn client_ip<B>(req: &Request<B>) -> Option<IpAddr> {
    if let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>() {
        return Some(addr.ip());
    }

    header_str(req, "x-forwarded-for")
        .and_then(|v| v.split(',').next())
        .and_then(|first| first.trim().parse().ok())
        .or_else(|| header_str(req, "x-real-ip").and_then(|v| v.trim().parse().ok()))
}

fn header_str<'a, B>(req: &'a Request<B>, name: &str) -> Option<&'a str> {
    req.headers().get(name).and_then(|v| v.to_str().ok())
}
