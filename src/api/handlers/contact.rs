//! Contact-form intake from the marketing site
//!
//! This endpoint answers outside the `ApiResponse` envelope: the
//! marketing page checks `status === "success"` on the body and shows
//! one generic error text for every failure cause.

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::auth::Session;
use crate::models::{AppError, Role};
use crate::telemetry::{UsageEvent, UsageKind};

use super::super::types::*;
use super::{failure, ApiFailure, AppState};

/// `POST /contact`
///
/// All three fields must be non-empty after trimming, or nothing is
/// stored or forwarded. Malformed JSON gets the same `{status:"error"}`
/// shape as a validation failure.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ContactRequest>, JsonRejection>,
) -> (StatusCode, Json<ContactResponse>) {
    let start = Instant::now();

    let req = match payload {
        Ok(Json(req)) => req,
        Err(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ContactResponse::error("Invalid request")),
            );
        }
    };

    let name = req.name.trim();
    let email = req.email.trim();
    let message = req.message.trim();
    if name.is_empty() || email.is_empty() || message.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(ContactResponse::error("All fields are required")),
        );
    }

    let stored = state
        .store
        .create_contact_message(
            name.to_string(),
            email.to_string(),
            message.to_string(),
            Utc::now(),
        )
        .await;

    let stored = match stored {
        Ok(stored) => stored,
        Err(e) => {
            warn!("⚠️ CONTACT intake failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ContactResponse::error("Could not store message")),
            );
        }
    };

    // Forward a copy to staff; the sender already got their answer, so
    // a relay failure only shows up in the log.
    if let Err(e) = state
        .mailer
        .send(
            &state.config.mail_from,
            &format!("Contact form: {}", stored.name),
            &format!("From: {} <{}>\n\n{}", stored.name, stored.email, stored.message),
        )
        .await
    {
        warn!("⚠️ CONTACT forward failed: {}", e);
    }

    state.telemetry.record_event(UsageEvent::new(
        UsageKind::ContactMessage,
        start.elapsed().as_millis() as u64,
        "",
    ));
    info!("✉️ CONTACT MESSAGE stored: id={}", stored.id);

    (StatusCode::OK, Json(ContactResponse::success()))
}

/// `GET /v1/contact/messages` (admin)
pub async fn inbox(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<ContactInboxData>>, ApiFailure> {
    let start = Instant::now();

    if session.role != Role::Admin {
        return Err(failure(start, AppError::forbidden("Access Denied")));
    }

    let messages = state
        .store
        .list_contact_messages()
        .await
        .map_err(|e| failure(start, e))?;

    Ok(Json(ApiResponse::success(
        ContactInboxData {
            total: messages.len(),
            messages,
        },
        super::elapsed_ms(start),
    )))
}
