//! Course listing, admin course upload, content regions, downloads

use axum::{
    extract::{Json, Multipart, Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

use crate::auth::Session;
use crate::models::{AppError, Role};
use crate::telemetry::{UsageEvent, UsageKind};
use crate::uploads::{content_type_for, course_upload_name, sanitize_filename};

use super::super::types::*;
use super::{bad_request, failure, ApiFailure, AppState};

/// `GET /v1/courses`
pub async fn list(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<CoursesData>>, ApiFailure> {
    let start = Instant::now();
    let courses = state
        .store
        .list_courses()
        .await
        .map_err(|e| failure(start, e))?;
    Ok(Json(ApiResponse::success(
        CoursesData {
            total: courses.len(),
            courses,
        },
        super::elapsed_ms(start),
    )))
}

/// `POST /v1/courses` (admin, multipart)
///
/// Fields: `title`, `description`, repeated `files`. Each file lands in
/// the upload vault under a timestamp-prefixed name and the course row
/// stores the joined list.
pub async fn create(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<UploadData>>, ApiFailure> {
    let start = Instant::now();

    if session.role != Role::Admin {
        return Err(failure(start, AppError::forbidden("Access Denied")));
    }

    let mut title = String::new();
    let mut description = String::new();
    let mut files: Vec<(String, Vec<u8>)> = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| bad_request(start, format!("multipart error: {}", e)))?
    {
        match field.name().unwrap_or_default() {
            "title" => {
                title = field
                    .text()
                    .await
                    .map_err(|e| bad_request(start, format!("multipart error: {}", e)))?;
            }
            "description" => {
                description = field
                    .text()
                    .await
                    .map_err(|e| bad_request(start, format!("multipart error: {}", e)))?;
            }
            "files" => {
                let original = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| bad_request(start, format!("multipart error: {}", e)))?;
                files.push((original, bytes.to_vec()));
            }
            _ => {}
        }
    }

    let title = super::required_field(start, "title", &title)?;

    let course = state
        .store
        .create_course(title, description.trim().to_string(), session.user_id, Utc::now())
        .await
        .map_err(|e| failure(start, e))?;

    let mut stored_files = Vec::with_capacity(files.len());
    let mut course = course;
    for (original, bytes) in files {
        let stored = course_upload_name(Utc::now(), &original).map_err(|e| failure(start, e))?;
        state
            .uploads
            .save(&stored, &bytes)
            .await
            .map_err(|e| failure(start, e))?;
        course = state
            .store
            .append_course_file(course.id, stored.clone())
            .await
            .map_err(|e| failure(start, e))?;
        stored_files.push(stored);
    }

    state.telemetry.record_event(UsageEvent::new(
        UsageKind::CourseUpload,
        start.elapsed().as_millis() as u64,
        format!("files={}", stored_files.len()),
    ));
    info!(
        "📚 COURSE CREATED: id={} files={}",
        course.id,
        stored_files.len()
    );

    Ok(Json(ApiResponse::success(
        UploadData {
            course,
            stored_files,
        },
        super::elapsed_ms(start),
    )))
}

/// `GET /v1/content`
///
/// The three display regions: PDFs and videos from course file
/// extensions, quizzes without their answers.
pub async fn content(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<ContentData>>, ApiFailure> {
    let start = Instant::now();

    let courses = state
        .store
        .list_courses()
        .await
        .map_err(|e| failure(start, e))?;
    let quizzes = state
        .store
        .list_quizzes()
        .await
        .map_err(|e| failure(start, e))?;

    let mut pdfs = Vec::new();
    let mut videos = Vec::new();
    for course in &courses {
        for file in &course.files {
            match file.rsplit('.').next().map(|e| e.to_ascii_lowercase()) {
                Some(ext) if ext == "pdf" => pdfs.push(file.clone()),
                Some(ext) if ext == "mp4" || ext == "webm" || ext == "mov" => {
                    videos.push(file.clone())
                }
                _ => {}
            }
        }
    }

    Ok(Json(ApiResponse::success(
        ContentData {
            pdfs,
            videos,
            quizzes: quizzes.iter().map(|q| q.public()).collect(),
        },
        super::elapsed_ms(start),
    )))
}

/// `GET /v1/uploads/:filename`
///
/// Authenticated download with attachment disposition. The name is
/// sanitized before it touches the filesystem, so traversal attempts
/// resolve inside the vault or 404.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response, ApiFailure> {
    let start = Instant::now();

    let clean =
        sanitize_filename(&filename).map_err(|_| failure(start, AppError::file_not_found(&filename)))?;
    let bytes = state
        .uploads
        .read(&clean)
        .await
        .map_err(|e| failure(start, e))?;

    let headers = [
        (header::CONTENT_TYPE, content_type_for(&clean).to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", clean),
        ),
    ];
    Ok((headers, bytes).into_response())
}
