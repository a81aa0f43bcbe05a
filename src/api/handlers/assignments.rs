//! Student assignment submission

use axum::{
    extract::{Json, Multipart, Path, State},
    Extension,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::auth::Session;
use crate::models::{AppError, Role};
use crate::telemetry::{UsageEvent, UsageKind};
use crate::uploads::assignment_upload_name;

use super::super::types::*;
use super::{bad_request, failure, ApiFailure, AppState};

/// `POST /v1/courses/:id/assignments` (student, multipart)
///
/// Single `assignment` file, stored as `{user}_{course}_{name}`.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Path(course_id): Path<i64>,
    Extension(session): Extension<Session>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<SubmissionData>>, ApiFailure> {
    let start = Instant::now();

    if session.role != Role::Student {
        return Err(failure(start, AppError::forbidden("Access Denied")));
    }

    let course = state
        .store
        .course_by_id(course_id)
        .await
        .map_err(|e| failure(start, e))?
        .ok_or_else(|| failure(start, AppError::not_found(format!("course {}", course_id))))?;

    let mut upload: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(start, format!("multipart error: {}", e)))?
    {
        if field.name() == Some("assignment") {
            let original = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|e| bad_request(start, format!("multipart error: {}", e)))?;
            upload = Some((original, bytes.to_vec()));
        }
    }

    let (original, bytes) =
        upload.ok_or_else(|| bad_request(start, "missing 'assignment' file field"))?;

    let stored = assignment_upload_name(session.user_id, course.id, &original)
        .map_err(|e| failure(start, e))?;
    state
        .uploads
        .save(&stored, &bytes)
        .await
        .map_err(|e| failure(start, e))?;

    let assignment = state
        .store
        .create_assignment(session.user_id, course.id, stored.clone(), Utc::now())
        .await
        .map_err(|e| failure(start, e))?;

    state.telemetry.record_event(UsageEvent::new(
        UsageKind::AssignmentSubmission,
        start.elapsed().as_millis() as u64,
        format!("course={}", course.id),
    ));
    info!(
        "📥 ASSIGNMENT SUBMITTED: user={} course={} file={}",
        session.user_id, course.id, stored
    );

    Ok(Json(ApiResponse::success(
        SubmissionData {
            assignment,
            stored_as: stored,
        },
        super::elapsed_ms(start),
    )))
}

/// `GET /v1/assignments/mine` (student)
pub async fn mine(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<AssignmentsData>>, ApiFailure> {
    let start = Instant::now();

    if session.role != Role::Student {
        return Err(failure(start, AppError::forbidden("Access Denied")));
    }

    let assignments = state
        .store
        .assignments_by_student(session.user_id)
        .await
        .map_err(|e| failure(start, e))?;

    Ok(Json(ApiResponse::success(
        AssignmentsData {
            total: assignments.len(),
            assignments,
        },
        super::elapsed_ms(start),
    )))
}
