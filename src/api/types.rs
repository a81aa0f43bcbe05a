//! API Request/Response Types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::auth::SessionStats;
use crate::models::{AppError, Assignment, Course, QuizPublic, QuizResult, Role};
use crate::store::TableCounts;
use crate::telemetry::UsageStats;

/// API Response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
    pub latency_ms: f64,
    pub timestamp: i64,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T, latency_ms: f64) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

impl ApiResponse<()> {
    pub fn error(error: ApiError, latency_ms: f64) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            latency_ms,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}

/// API Error
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "API_BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }

    pub fn unauthorized() -> Self {
        Self {
            code: "API_UNAUTHORIZED".to_string(),
            message: "Missing or invalid session token".to_string(),
            details: None,
        }
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self {
            code: "API_RATE_LIMITED".to_string(),
            message: format!("Rate limit exceeded. Retry after {} seconds", retry_after),
            details: Some(format!("retry_after: {}", retry_after)),
        }
    }
}

impl From<&AppError> for ApiError {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code_str().to_string(),
            message: err.message.clone(),
            details: err.source.as_ref().map(|s| s.to_string()),
        }
    }
}

// ============================================
// Auth
// ============================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    "student".to_string()
}

#[derive(Debug, Serialize)]
pub struct RegisterData {
    pub user_id: i64,
    pub email: String,
    /// Verification mail handed to the transport
    pub verification_sent: bool,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyData {
    pub email: String,
    pub verified: bool,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    /// Pending token; not valid on protected routes until the OTP step
    pub token: String,
    pub otp_required: bool,
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct OtpRequest {
    pub token: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct OtpData {
    /// Same token, now active
    pub token: String,
    pub role: Role,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct LogoutData {
    pub revoked: bool,
}

/// `GET /v1/auth/me`
#[derive(Debug, Serialize)]
pub struct MeData {
    pub user_id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    /// Seconds until the session expires
    pub session_expires_in: u64,
}

#[derive(Debug, Serialize)]
pub struct DashboardData {
    pub name: String,
    pub email: String,
    pub role: Role,
    pub courses: Vec<Course>,
    /// Student view only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignments: Option<Vec<Assignment>>,
    /// Student view only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quiz_results: Option<Vec<QuizResult>>,
    /// Admin view only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform: Option<TableCounts>,
}

// ============================================
// Courses & Uploads
// ============================================

#[derive(Debug, Serialize)]
pub struct CoursesData {
    pub total: usize,
    pub courses: Vec<Course>,
}

#[derive(Debug, Serialize)]
pub struct UploadData {
    pub course: Course,
    /// Names the files were stored under
    pub stored_files: Vec<String>,
}

/// The three display regions of the dashboard content pane
#[derive(Debug, Serialize)]
pub struct ContentData {
    pub pdfs: Vec<String>,
    pub videos: Vec<String>,
    pub quizzes: Vec<QuizPublic>,
}

#[derive(Debug, Serialize)]
pub struct AssignmentsData {
    pub total: usize,
    pub assignments: Vec<Assignment>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionData {
    pub assignment: Assignment,
    pub stored_as: String,
}

// ============================================
// Quizzes
// ============================================

#[derive(Debug, Serialize)]
pub struct QuizzesData {
    pub total: usize,
    pub quizzes: Vec<QuizPublic>,
}

#[derive(Debug, Deserialize)]
pub struct QuizSubmitRequest {
    /// Quiz id -> chosen answer
    pub answers: HashMap<i64, String>,
}

#[derive(Debug, Serialize)]
pub struct QuizScoreData {
    pub score: i64,
    /// Denominator is the whole question bank
    pub total: i64,
}

// ============================================
// Contact & Chatbot
// ============================================

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Contact form wire shape
///
/// The marketing page checks `status === "success"` on this exact
/// shape, so the endpoint answers outside the `ApiResponse` envelope.
#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ContactResponse {
    pub fn success() -> Self {
        Self {
            status: "success",
            message: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: Some(message.into()),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ContactInboxData {
    pub total: usize,
    pub messages: Vec<crate::models::ContactMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatbotRequest {
    pub message: String,
}

/// The chat client reads the `response` key, so the field keeps that name
#[derive(Debug, Serialize)]
pub struct ChatbotData {
    pub response: String,
}

// ============================================
// Stats / Telemetry
// ============================================

#[derive(Debug, Serialize)]
pub struct StatsData {
    pub platform: TableCounts,
    pub sessions: SessionStats,
    pub usage: UsageStats,
    pub uptime_seconds: u64,
    pub api_version: String,
}

// ============================================
// Health Check
// ============================================

#[derive(Debug, Serialize)]
pub struct HealthData {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}
