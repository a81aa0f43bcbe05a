//! Echo chatbot endpoint

use axum::{
    extract::{Json, State},
    Extension,
};
use std::sync::Arc;
use std::time::Instant;

use crate::auth::Session;
use crate::telemetry::{UsageEvent, UsageKind};

use super::super::types::*;
use super::{ApiFailure, AppState};

/// `POST /v1/chatbot`
///
/// Echoes the prompt back with the fixed `BelayBot says:` prefix.
pub async fn prompt(
    State(state): State<Arc<AppState>>,
    Extension(_session): Extension<Session>,
    Json(req): Json<ChatbotRequest>,
) -> Result<Json<ApiResponse<ChatbotData>>, ApiFailure> {
    let start = Instant::now();

    let response = format!("BelayBot says: You typed '{}'", req.message);

    state.telemetry.record_event(UsageEvent::new(
        UsageKind::ChatbotPrompt,
        start.elapsed().as_millis() as u64,
        "",
    ));

    Ok(Json(ApiResponse::success(
        ChatbotData { response },
        super::elapsed_ms(start),
    )))
}
