//! Health and platform statistics

use axum::{
    extract::{Json, State},
    Extension,
};
use std::sync::Arc;
use std::time::Instant;

use crate::auth::Session;
use crate::models::{AppError, Role};

use super::super::types::*;
use super::{failure, ApiFailure, AppState};

/// `GET /health` and `GET /v1/health`
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthData>> {
    let start = Instant::now();

    let data = HealthData {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
    };

    Json(ApiResponse::success(data, super::elapsed_ms(start)))
}

/// `GET /v1/stats` (admin)
pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<StatsData>>, ApiFailure> {
    let start = Instant::now();

    if session.role != Role::Admin {
        return Err(failure(start, AppError::forbidden("Access Denied")));
    }

    let platform = state.store.counts().await.map_err(|e| failure(start, e))?;

    let data = StatsData {
        platform,
        sessions: state.sessions.stats(),
        usage: state.telemetry.get_stats(),
        uptime_seconds: state.uptime_seconds(),
        api_version: env!("CARGO_PKG_VERSION").to_string(),
    };

    Ok(Json(ApiResponse::success(data, super::elapsed_ms(start))))
}
