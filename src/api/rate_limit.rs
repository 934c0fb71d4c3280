//! Sliding-window rate limiter, keyed per route class.
//!
//! Each key holds a `{count, reset_at}` window that restarts on the first
//! request after it expires. State is process-local and resets on restart,
//! which is acceptable for the griefing threat model.

use crate::error::AppError;
use axum::http::HeaderMap;
use axum::response::{IntoResponseParts, ResponseParts};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Mutex;

/// Per-minute limits by route class.
pub const AUTHED_PER_MIN: u32 = 60;
pub const CHAT_PER_MIN: u32 = 10;
pub const REGISTER_PER_MIN: u32 = 5;
pub const PUBLIC_PER_MIN: u32 = 30;

const WINDOW_MS: u64 = 60_000;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: u64,
}

/// The headers attached to every response that passed the limiter.
#[derive(Debug, Clone, Copy)]
pub struct RateHeaders {
    pub limit: u32,
    pub remaining: u32,
    pub reset_at_secs: u64,
}

impl IntoResponseParts for RateHeaders {
    type Error = std::convert::Infallible;

    fn into_response_parts(self, mut parts: ResponseParts) -> Result<ResponseParts, Self::Error> {
        let headers = parts.headers_mut();
        if let Ok(v) = self.limit.to_string().parse() {
            headers.insert("x-ratelimit-limit", v);
        }
        if let Ok(v) = self.remaining.to_string().parse() {
            headers.insert("x-ratelimit-remaining", v);
        }
        if let Ok(v) = self.reset_at_secs.to_string().parse() {
            headers.insert("x-ratelimit-reset", v);
        }
        Ok(parts)
    }
}

#[derive(Default)]
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one request against `key`. Returns the response headers, or a
    /// 429 with a `retryAfter` hint once the window is exhausted.
    pub fn check(&self, key: &str, limit: u32, now_ms: u64) -> Result<RateHeaders, AppError> {
        let mut windows = self.windows.lock().expect("rate limiter poisoned");
        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            reset_at: now_ms + WINDOW_MS,
        });
        if now_ms >= window.reset_at {
            window.count = 0;
            window.reset_at = now_ms + WINDOW_MS;
        }
        if window.count >= limit {
            let retry_after = (window.reset_at - now_ms).div_ceil(1000);
            return Err(AppError::RateLimited { retry_after });
        }
        window.count += 1;
        Ok(RateHeaders {
            limit,
            remaining: limit - window.count,
            reset_at_secs: window.reset_at / 1000,
        })
    }
}

/// Best-effort client IP: first hop of X-Forwarded-For, else the socket
/// peer address.
pub fn client_ip(headers: &HeaderMap, addr: Option<SocketAddr>) -> String {
    headers
        .get("x-forwarded-for")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.split(',').next())
        .map(|ip| ip.trim().to_string())
        .or_else(|| addr.map(|a| a.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requests_count_down_the_window() {
        let limiter = RateLimiter::new();
        for i in 0..5 {
            let headers = limiter.check("ip:1.2.3.4", 5, 0).unwrap();
            assert_eq!(headers.limit, 5);
            assert_eq!(headers.remaining, 4 - i);
        }
        let err = limiter.check("ip:1.2.3.4", 5, 0).unwrap_err();
        match err {
            AppError::RateLimited { retry_after } => assert_eq!(retry_after, 60),
            other => panic!("expected RateLimited, got {other:?}"),
        }
    }

    #[test]
    fn window_resets_after_expiry() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            limiter.check("k", 5, 0).unwrap();
        }
        assert!(limiter.check("k", 5, 0).is_err());
        let headers = limiter.check("k", 5, WINDOW_MS).unwrap();
        assert_eq!(headers.remaining, 4);
    }

    #[test]
    fn keys_are_independent() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            limiter.check("a", 5, 0).unwrap();
        }
        assert!(limiter.check("a", 5, 0).is_err());
        assert!(limiter.check("b", 5, 0).is_ok());
    }

    #[test]
    fn forwarded_header_wins_over_socket_addr() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", "9.8.7.6, 1.1.1.1".parse().unwrap());
        let addr: SocketAddr = "127.0.0.1:9000".parse().unwrap();
        assert_eq!(client_ip(&headers, Some(addr)), "9.8.7.6");
        assert_eq!(client_ip(&HeaderMap::new(), Some(addr)), "127.0.0.1");
        assert_eq!(client_ip(&HeaderMap::new(), None), "unknown");
    }
}
