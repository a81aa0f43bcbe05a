//! API Request Handlers
//!
//! One file per surface area; everything here speaks the
//! `ApiResponse` envelope except the contact form, which keeps the
//! fixed `{status}` shape the marketing page consumes.

use axum::{http::StatusCode, Json};
use std::sync::Arc;
use std::time::Instant;

use crate::auth::SessionStore;
use crate::config::AppConfig;
use crate::models::AppError;
use crate::providers::Mailer;
use crate::store::Store;
use crate::telemetry::TelemetryCollector;
use crate::uploads::Uploads;

use super::types::{ApiError, ApiResponse};

pub mod assignments;
pub mod auth;
pub mod chatbot;
pub mod contact;
pub mod courses;
pub mod quizzes;
pub mod system;

/// Shared application state
pub struct AppState {
    pub config: AppConfig,
    pub store: Store,
    pub sessions: SessionStore,
    pub uploads: Uploads,
    pub mailer: Mailer,
    pub telemetry: Arc<TelemetryCollector>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        store: Store,
        uploads: Uploads,
        mailer: Mailer,
        telemetry: Arc<TelemetryCollector>,
    ) -> Self {
        let sessions = SessionStore::new(config.session_ttl, config.pending_ttl);

        // Background task: sweep expired sessions every 60 seconds
        let sessions_clone = sessions.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(std::time::Duration::from_secs(60));
            loop {
                interval.tick().await;
                sessions_clone.cleanup_expired();
            }
        });

        Self {
            config,
            store,
            sessions,
            uploads,
            mailer,
            telemetry,
            start_time: Instant::now(),
        }
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}

/// Envelope failure: status code plus the error body
pub type ApiFailure = (StatusCode, Json<ApiResponse<()>>);

/// Milliseconds elapsed since the handler started
pub(crate) fn elapsed_ms(start: Instant) -> f64 {
    start.elapsed().as_secs_f64() * 1000.0
}

/// Shape an `AppError` into the envelope failure for this handler
pub(crate) fn failure(start: Instant, err: AppError) -> ApiFailure {
    let status = StatusCode::from_u16(err.code.http_status())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(ApiResponse::error((&err).into(), elapsed_ms(start))),
    )
}

/// Bad-request failure for malformed payloads
pub(crate) fn bad_request(start: Instant, message: impl Into<String>) -> ApiFailure {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiResponse::error(
            ApiError::bad_request(message),
            elapsed_ms(start),
        )),
    )
}

/// Trim a required field, rejecting empty-after-trim values
pub(crate) fn required_field(start: Instant, name: &str, value: &str) -> Result<String, ApiFailure> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(failure(start, AppError::empty_field(name)));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ErrorCode;

    #[test]
    fn test_failure_maps_http_status() {
        let start = Instant::now();
        let (status, body) = failure(start, AppError::not_verified());
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(
            body.0.error.as_ref().unwrap().code,
            ErrorCode::AuthNotVerified.as_str()
        );
    }

    #[test]
    fn test_required_field_trims() {
        let start = Instant::now();
        assert_eq!(required_field(start, "name", "  Ada ").unwrap(), "Ada");
        let (status, _) = required_field(start, "name", "   ").unwrap_err();
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
