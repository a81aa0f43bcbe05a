//! Quiz listing and grading

use axum::{
    extract::{Json, State},
    Extension,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::auth::Session;
use crate::telemetry::{UsageEvent, UsageKind};

use super::super::types::*;
use super::{failure, ApiFailure, AppState};

/// `GET /v1/quizzes`
///
/// Questions and options only; answers never cross the wire.
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<QuizzesData>>, ApiFailure> {
    let start = Instant::now();
    let quizzes = state
        .store
        .list_quizzes()
        .await
        .map_err(|e| failure(start, e))?;
    Ok(Json(ApiResponse::success(
        QuizzesData {
            total: quizzes.len(),
            quizzes: quizzes.iter().map(|q| q.public()).collect(),
        },
        super::elapsed_ms(start),
    )))
}

/// `POST /v1/quizzes/submit`
///
/// Score is the count of answers matching after trimming and
/// lowercasing both sides; unknown quiz ids are ignored. The reported
/// denominator is the whole question bank, not the answered subset.
pub async fn submit(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(req): Json<QuizSubmitRequest>,
) -> Result<Json<ApiResponse<QuizScoreData>>, ApiFailure> {
    let start = Instant::now();

    let quizzes = state
        .store
        .list_quizzes()
        .await
        .map_err(|e| failure(start, e))?;

    let mut score = 0i64;
    for quiz in &quizzes {
        if let Some(given) = req.answers.get(&quiz.id) {
            if quiz.accepts(given) {
                score += 1;
            }
        }
    }
    let total = quizzes.len() as i64;

    state
        .store
        .record_quiz_result(session.user_id, score, total, Utc::now())
        .await
        .map_err(|e| failure(start, e))?;

    state.telemetry.record_event(UsageEvent::new(
        UsageKind::QuizAttempt,
        start.elapsed().as_millis() as u64,
        format!("score={}/{}", score, total),
    ));
    info!(
        "📝 QUIZ GRADED: user={} score={}/{}",
        session.user_id, score, total
    );

    Ok(Json(ApiResponse::success(
        QuizScoreData { score, total },
        super::elapsed_ms(start),
    )))
}
