//! API Middleware (Session Auth, Rate Limiting, Logging)

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::handlers::AppState;
use super::types::{ApiError, ApiResponse};

/// Rate limiter configuration
pub struct RateLimitConfig {
    /// Requests per window
    pub requests_per_window: u32,
    /// Window duration
    pub window_duration: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        let max = std::env::var("BELAY_RATE_LIMIT_MAX")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(120);
        let window_secs = std::env::var("BELAY_RATE_LIMIT_WINDOW_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);
        Self {
            requests_per_window: max,
            window_duration: Duration::from_secs(window_secs),
        }
    }
}

/// In-memory fixed-window rate limiter, keyed per client
pub struct RateLimiter {
    /// Request counts per session token / forwarded IP
    requests: DashMap<String, (u32, Instant)>,
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            requests: DashMap::new(),
            config,
        }
    }

    /// Check if request is allowed, returns (allowed, remaining, reset_seconds)
    pub fn check(&self, key: &str) -> (bool, u32, u64) {
        let now = Instant::now();

        let mut entry = self.requests.entry(key.to_string()).or_insert((0, now));

        // Reset window if expired
        if now.duration_since(entry.1) > self.config.window_duration {
            entry.0 = 0;
            entry.1 = now;
        }

        let remaining = self.config.requests_per_window.saturating_sub(entry.0);
        let reset_secs = self
            .config
            .window_duration
            .saturating_sub(now.duration_since(entry.1))
            .as_secs();

        if entry.0 >= self.config.requests_per_window {
            return (false, 0, reset_secs);
        }

        entry.0 += 1;
        (true, remaining - 1, reset_secs)
    }

    /// Cleanup stale windows (call periodically)
    pub fn cleanup(&self) {
        let now = Instant::now();
        self.requests.retain(|_, (_, timestamp)| {
            now.duration_since(*timestamp) < self.config.window_duration * 2
        });
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

// Global rate limiter instance
lazy_static::lazy_static! {
    pub static ref RATE_LIMITER: Arc<RateLimiter> = Arc::new(RateLimiter::default());
}

/// Background task sweeping stale rate-limit windows
pub fn start_cleanup_task() {
    tokio::spawn(async {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            RATE_LIMITER.cleanup();
        }
    });
}

/// Pull the session token out of `X-Session-Token` or `Authorization: Bearer`
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("X-Session-Token")
        .or_else(|| headers.get("x-session-token"))
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get("Authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Session authentication middleware for protected routes
///
/// Resolves the token to an `Active` session and stashes it in the
/// request extensions; pending, expired and missing tokens are rejected
/// with the envelope error before a handler runs.
pub async fn session_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let token = match extract_token(request.headers()) {
        Some(token) => token.to_string(),
        None => {
            return unauthorized(ApiError::unauthorized(), start);
        }
    };

    match state.sessions.get_active(&token) {
        Ok(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        Err(err) => {
            warn!("🚫 SESSION REJECTED: {}", err);
            unauthorized((&err).into(), start)
        }
    }
}

fn unauthorized(error: ApiError, start: Instant) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(ApiResponse::error(
            error,
            start.elapsed().as_secs_f64() * 1000.0,
        )),
    )
        .into_response()
}

/// Rate limiting middleware
pub async fn rate_limit_middleware(headers: HeaderMap, request: Request, next: Next) -> Response {
    let start = Instant::now();

    // Skip rate limiting for health check
    if request.uri().path() == "/health" || request.uri().path() == "/v1/health" {
        return next.run(request).await;
    }

    // Get rate limit key (session token or IP)
    let rate_key = extract_token(&headers)
        .map(|t| t.to_string())
        .unwrap_or_else(|| {
            // Fallback to IP-based limiting
            headers
                .get("X-Forwarded-For")
                .or_else(|| headers.get("x-real-ip"))
                .and_then(|v| v.to_str().ok())
                .unwrap_or("unknown")
                .to_string()
        });

    let (allowed, remaining, reset) = RATE_LIMITER.check(&rate_key);

    if !allowed {
        warn!(key = %rate_key, "Rate limit exceeded");
        let mut response = (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ApiResponse::error(
                ApiError::rate_limited(reset),
                start.elapsed().as_secs_f64() * 1000.0,
            )),
        )
            .into_response();
        response.headers_mut().insert("Retry-After", reset.into());
        return response;
    }

    let mut response = next.run(request).await;

    // Add rate limit headers
    let headers = response.headers_mut();
    headers.insert("X-RateLimit-Remaining", remaining.into());
    headers.insert("X-RateLimit-Reset", reset.into());

    response
}

/// Request logging middleware; also feeds the request counters
pub async fn logging_middleware(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let method = request.method().clone();
    let uri = request.uri().clone();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    state
        .telemetry
        .record_request(latency.as_millis() as u64, status.is_success());

    info!(
        method = %method,
        uri = %uri,
        status = %status.as_u16(),
        latency_ms = %latency.as_millis(),
        "Request completed"
    );

    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limiter_window() {
        let limiter = RateLimiter::new(RateLimitConfig {
            requests_per_window: 3,
            window_duration: Duration::from_secs(60),
        });

        let (ok1, rem1, _) = limiter.check("client-a");
        assert!(ok1);
        assert_eq!(rem1, 2);
        assert!(limiter.check("client-a").0);
        assert!(limiter.check("client-a").0);

        let (blocked, rem, reset) = limiter.check("client-a");
        assert!(!blocked);
        assert_eq!(rem, 0);
        assert!(reset <= 60);

        // Other clients are unaffected
        assert!(limiter.check("client-b").0);
    }

    #[test]
    fn test_cleanup_drops_stale_windows() {
        let limiter = RateLimiter::new(RateLimitConfig {
            requests_per_window: 10,
            window_duration: Duration::ZERO,
        });
        limiter.check("stale");
        limiter.cleanup();
        assert!(limiter.requests.is_empty());
    }

    #[test]
    fn test_extract_token_sources() {
        let mut headers = HeaderMap::new();
        assert!(extract_token(&headers).is_none());

        headers.insert("Authorization", "Bearer abc-123".parse().unwrap());
        assert_eq!(extract_token(&headers), Some("abc-123"));

        // Dedicated header wins over Authorization
        headers.insert("X-Session-Token", "tok-9".parse().unwrap());
        assert_eq!(extract_token(&headers), Some("tok-9"));

        let mut empty = HeaderMap::new();
        empty.insert("X-Session-Token", "  ".parse().unwrap());
        assert!(extract_token(&empty).is_none());
    }
}
