//! Per-address request budget over a fixed window.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Response},
};

use super::audit::client_address;
use crate::config::ApiConfig;
use crate::error::ApiError;

// Expired windows are swept once this many addresses are tracked
const SWEEP_THRESHOLD: usize = 16_384;

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

#[derive(Debug)]
pub struct RateLimiter {
    limit: u32,
    window: Duration,
    windows: Mutex<HashMap<String, Window>>,
}

/// Outcome of one request against its address's budget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allowed,
    Limited { retry_after: Duration },
}

impl RateLimiter {
    pub fn new(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window: window.max(Duration::from_secs(1)),
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Self {
        Self::new(config.rate_limit_requests, Duration::from_secs(config.rate_limit_window_secs))
    }

    pub fn check(&self, key: &str) -> Admission {
        self.check_at(key, Instant::now())
    }

    fn check_at(&self, key: &str, now: Instant) -> Admission {
        let Ok(mut windows) = self.windows.lock() else {
            // A poisoned map only loses counts; keep serving
            return Admission::Allowed;
        };

        if windows.len() >= SWEEP_THRESHOLD && !windows.contains_key(key) {
            let window = self.window;
            windows.retain(|_, w| now.duration_since(w.started) < window);
        }

        let entry = windows.entry(key.to_string()).or_insert(Window { started: now, count: 0 });
        let elapsed = now.duration_since(entry.started);
        if elapsed >= self.window {
            *entry = Window { started: now, count: 0 };
        }

        if entry.count >= self.limit {
            return Admission::Limited {
                retry_after: self.window.saturating_sub(now.duration_since(entry.started)),
            };
        }
        entry.count += 1;
        Admission::Allowed
    }
}

/// Global middleware answering 429 once an address spends its budget
pub async fn limit_requests(State(limiter): State<Arc<RateLimiter>>, request: Request, next: Next) -> Response {
    let address = client_address(&request);

    match limiter.check(&address) {
        Admission::Allowed => next.run(request).await,
        Admission::Limited { retry_after } => {
            tracing::warn!("Rate limit exceeded for {}", address);
            let mut response = ApiError::too_many_requests("Too many requests from this IP").into_response();
            let secs = retry_after.as_secs().max(1);
            if let Ok(value) = HeaderValue::from_str(&secs.to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn budget_is_per_address() {
        let limiter = RateLimiter::new(2, Duration::from_secs(60));
        let now = Instant::now();

        assert_eq!(limiter.check_at("10.0.0.1", now), Admission::Allowed);
        assert_eq!(limiter.check_at("10.0.0.1", now), Admission::Allowed);
        assert!(matches!(limiter.check_at("10.0.0.1", now), Admission::Limited { .. }));
        assert_eq!(limiter.check_at("10.0.0.2", now), Admission::Allowed);
    }

    #[test]
    fn window_resets_after_it_elapses() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));
        let start = Instant::now();

        assert_eq!(limiter.check_at("a", start), Admission::Allowed);
        match limiter.check_at("a", start + Duration::from_secs(45)) {
            Admission::Limited { retry_after } => assert_eq!(retry_after, Duration::from_secs(15)),
            other => panic!("expected a limit, got {:?}", other),
        }
        assert_eq!(limiter.check_at("a", start + Duration::from_secs(60)), Admission::Allowed);
    }

    #[test]
    fn rejected_requests_do_not_extend_the_window() {
        let limiter = RateLimiter::new(1, Duration::from_secs(10));
        let start = Instant::now();

        assert_eq!(limiter.check_at("a", start), Admission::Allowed);
        for offset in 1..10 {
            let at = start + Duration::from_secs(offset);
            assert!(matches!(limiter.check_at("a", at), Admission::Limited { .. }));
        }
        assert_eq!(limiter.check_at("a", start + Duration::from_secs(10)), Admission::Allowed);
    }
}
