//! Fixed-window rate limiting, per client IP.
//!
//! One window of `max` requests per `window` duration. State lives in a
//! DashMap keyed by IP; entries are pruned by a background task so the map
//! does not grow unbounded.

use std::{
    collections::VecDeque,
    net::IpAddr,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;
use serde::Serialize;

use crate::config::RateLimitSettings;

#[derive(Serialize)]
struct RateLimitResponse {
    error: String,
    retry_after: Option<u64>,
}

#[derive(Debug)]
pub enum RateLimitError {
    LimitExceeded(u64), // seconds to wait
}

/// Thread-safe fixed-window limiter.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    max: u32,
    window: Duration,
    // key -> (request timestamps inside the window, window start)
    limits: Arc<DashMap<String, (VecDeque<Instant>, Instant)>>,
}

impl RateLimiter {
    pub fn new(settings: &RateLimitSettings) -> Self {
        Self {
            max: settings.max,
            window: Duration::from_millis(settings.window_ms),
            limits: Arc::new(DashMap::new()),
        }
    }

    /// Check whether another request from `key` fits in the current window.
    pub fn check_limit(&self, key: &str) -> Result<(), RateLimitError> {
        let mut entry = self
            .limits
            .entry(key.to_string())
            .or_insert_with(|| (VecDeque::new(), Instant::now()));

        let now = Instant::now();

        // Reset window if needed
        if now.duration_since(entry.1) >= self.window {
            entry.0.clear();
            entry.1 = now;
        }

        // Drop requests that slid out of the window
        while let Some(&oldest) = entry.0.front() {
            if now.duration_since(oldest) >= self.window {
                entry.0.pop_front();
            } else {
                break;
            }
        }

        if entry.0.len() >= self.max as usize {
            let retry_after = entry
                .0
                .front()
                .map(|oldest| self.window - now.duration_since(*oldest))
                .unwrap_or(self.window);
            return Err(RateLimitError::LimitExceeded(retry_after.as_secs().max(1)));
        }

        entry.0.push_back(now);
        Ok(())
    }

    /// Drop stale entries to keep memory bounded.
    pub fn cleanup(&self) {
        let now = Instant::now();
        // None while the clock is younger than two windows
        let cutoff = now.checked_sub(self.window * 2);
        self.limits.retain(|_, (requests, window_start)| {
            while let Some(&oldest) = requests.front() {
                if now.duration_since(oldest) >= self.window {
                    requests.pop_front();
                } else {
                    break;
                }
            }
            !requests.is_empty() || cutoff.map_or(true, |cutoff| *window_start > cutoff)
        });
    }

    /// Spawn the periodic cleanup task for a shared limiter.
    pub fn spawn_cleanup(limiter: Arc<RateLimiter>) {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup();
            }
        });
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<Arc<RateLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = extract_ip_address(&request);

    match limiter.check_limit(&ip) {
        Ok(()) => next.run(request).await,
        Err(RateLimitError::LimitExceeded(retry_after)) => {
            let body = RateLimitResponse {
                error: "Rate limit exceeded".to_string(),
                retry_after: Some(retry_after),
            };
            (
                StatusCode::TOO_MANY_REQUESTS,
                [("Retry-After", retry_after.to_string())],
                axum::Json(body),
            )
                .into_response()
        }
    }
}

/// Extract the client IP, preferring proxy headers.
fn extract_ip_address(request: &Request) -> String {
    if let Some(forwarded_for) = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
    {
        if let Some(first_ip) = forwarded_for.split(',').next() {
            if let Ok(ip) = first_ip.trim().parse::<IpAddr>() {
                return ip.to_string();
            }
        }
    }

    if let Some(real_ip) = request
        .headers()
        .get("x-real-ip")
        .and_then(|h| h.to_str().ok())
        .and_then(|ip| ip.parse::<IpAddr>().ok())
    {
        return real_ip.to_string();
    }

    "unknown".to_string()
}
