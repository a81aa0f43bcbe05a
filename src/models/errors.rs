//! Centralized error handling
//!
//! Every failure carries a unique error code so production logs can be
//! filtered by class without string-matching messages.
//!
//! Error codes follow pattern: CATEGORY_SPECIFIC_ERROR
//! - AUTH_xxx: credential, OTP and session errors
//! - VALIDATION_xxx: request payload validation
//! - DB_xxx: persistence errors
//! - UPLOAD_xxx: file intake and download errors
//! - MAIL_xxx: outbound mail errors
//! - API_xxx: surface-level errors

use std::fmt;

/// Application-wide error type; all handler and store failures flow
/// through this before they are shaped into an HTTP response.
#[derive(Debug)]
pub struct AppError {
    /// Unique error code for logging/monitoring
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Optional underlying error
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl AppError {
    /// Create a new AppError
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create AppError with source error
    pub fn with_source(
        code: ErrorCode,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get error code as string (for logging)
    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Unique error codes for monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // ============================================
    // Auth Errors
    // ============================================
    /// Email/password pair rejected
    AuthInvalidCredentials,
    /// No account for the given email
    AuthUserNotFound,
    /// Account exists but email is not verified yet
    AuthNotVerified,
    /// OTP code rejected by the active policy
    AuthInvalidOtp,
    /// Registration verification code mismatch
    AuthInvalidVerificationCode,
    /// No session token on a protected route
    SessionMissing,
    /// Token valid once, now expired or revoked
    SessionExpired,
    /// Session exists but has not passed the OTP step
    SessionPending,
    /// Authenticated but wrong role for the route
    Forbidden,

    // ============================================
    // Validation Errors
    // ============================================
    /// A required field is empty after trimming
    ValidationEmptyField,
    /// Role is neither `student` nor `admin`
    ValidationInvalidRole,

    // ============================================
    // Persistence Errors
    // ============================================
    /// Could not open or migrate the database
    DbOpenFailed,
    /// Query or statement failure
    DbQueryFailed,
    /// Unique constraint violation (duplicate email)
    DbConflict,
    /// Database file locked by another writer
    DbBusy,

    // ============================================
    // Upload Errors
    // ============================================
    /// Filename empty or contains path components
    UploadInvalidFilename,
    /// Multipart body over the configured cap
    UploadTooLarge,
    /// Filesystem write failed
    UploadIoFailed,
    /// Stored file missing on download
    FileNotFound,

    // ============================================
    // Mail Errors
    // ============================================
    /// Relay rejected or did not answer
    MailSendFailed,
    /// Relay transport selected without an endpoint
    MailRelayMisconfigured,

    // ============================================
    // API Errors
    // ============================================
    /// Invalid request format
    ApiBadRequest,
    /// Missing/invalid credentials at the surface
    ApiUnauthorized,
    /// Rate limit exceeded
    ApiRateLimited,
    /// Internal server error
    ApiInternalError,
    /// Resource not found
    ApiNotFound,

    // ============================================
    // Generic Errors
    // ============================================
    /// Unknown error
    Unknown,
}

impl ErrorCode {
    /// Get string representation of error code
    pub fn as_str(&self) -> &'static str {
        match self {
            // Auth
            Self::AuthInvalidCredentials => "AUTH_INVALID_CREDENTIALS",
            Self::AuthUserNotFound => "AUTH_USER_NOT_FOUND",
            Self::AuthNotVerified => "AUTH_NOT_VERIFIED",
            Self::AuthInvalidOtp => "AUTH_INVALID_OTP",
            Self::AuthInvalidVerificationCode => "AUTH_INVALID_VERIFICATION_CODE",
            Self::SessionMissing => "AUTH_SESSION_MISSING",
            Self::SessionExpired => "AUTH_SESSION_EXPIRED",
            Self::SessionPending => "AUTH_SESSION_PENDING",
            Self::Forbidden => "AUTH_FORBIDDEN",

            // Validation
            Self::ValidationEmptyField => "VALIDATION_EMPTY_FIELD",
            Self::ValidationInvalidRole => "VALIDATION_INVALID_ROLE",

            // Persistence
            Self::DbOpenFailed => "DB_OPEN_FAILED",
            Self::DbQueryFailed => "DB_QUERY_FAILED",
            Self::DbConflict => "DB_CONFLICT",
            Self::DbBusy => "DB_BUSY",

            // Upload
            Self::UploadInvalidFilename => "UPLOAD_INVALID_FILENAME",
            Self::UploadTooLarge => "UPLOAD_TOO_LARGE",
            Self::UploadIoFailed => "UPLOAD_IO_FAILED",
            Self::FileNotFound => "UPLOAD_FILE_NOT_FOUND",

            // Mail
            Self::MailSendFailed => "MAIL_SEND_FAILED",
            Self::MailRelayMisconfigured => "MAIL_RELAY_MISCONFIGURED",

            // API
            Self::ApiBadRequest => "API_BAD_REQUEST",
            Self::ApiUnauthorized => "API_UNAUTHORIZED",
            Self::ApiRateLimited => "API_RATE_LIMITED",
            Self::ApiInternalError => "API_INTERNAL_ERROR",
            Self::ApiNotFound => "API_NOT_FOUND",

            // Generic
            Self::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Get HTTP status code for API responses
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ApiBadRequest
            | Self::ValidationEmptyField
            | Self::ValidationInvalidRole
            | Self::UploadInvalidFilename => 400,
            Self::ApiUnauthorized
            | Self::AuthInvalidCredentials
            | Self::AuthUserNotFound
            | Self::AuthInvalidOtp
            | Self::AuthInvalidVerificationCode
            | Self::SessionMissing
            | Self::SessionExpired
            | Self::SessionPending => 401,
            Self::AuthNotVerified | Self::Forbidden => 403,
            Self::ApiNotFound | Self::FileNotFound => 404,
            Self::DbConflict => 409,
            Self::UploadTooLarge => 413,
            Self::ApiRateLimited => 429,
            Self::MailSendFailed => 502,
            _ => 500,
        }
    }

    /// Check if error is worth retrying on the client side
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::DbBusy | Self::MailSendFailed | Self::ApiRateLimited
        )
    }
}

// ============================================
// Convenience constructors
// ============================================

impl AppError {
    /// Email/password rejected
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::AuthInvalidCredentials, "Invalid email or password")
    }

    /// No account for email
    pub fn user_not_found() -> Self {
        Self::new(ErrorCode::AuthUserNotFound, "User not found")
    }

    /// Email not verified yet
    pub fn not_verified() -> Self {
        Self::new(ErrorCode::AuthNotVerified, "Verify your email first")
    }

    /// OTP rejected
    pub fn invalid_otp(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalidOtp, msg)
    }

    /// Verification code mismatch
    pub fn invalid_verification_code() -> Self {
        Self::new(ErrorCode::AuthInvalidVerificationCode, "Invalid code")
    }

    /// Missing session token
    pub fn session_missing() -> Self {
        Self::new(ErrorCode::SessionMissing, "Missing session token")
    }

    /// Expired or revoked session
    pub fn session_expired() -> Self {
        Self::new(ErrorCode::SessionExpired, "Session expired, log in again")
    }

    /// Session still waiting on the OTP step
    pub fn session_pending() -> Self {
        Self::new(ErrorCode::SessionPending, "Complete the OTP step first")
    }

    /// Wrong role for the route
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, msg)
    }

    /// Required field empty after trimming
    pub fn empty_field(field: &str) -> Self {
        Self::new(
            ErrorCode::ValidationEmptyField,
            format!("Field '{}' must not be empty", field),
        )
    }

    /// Unknown role string
    pub fn invalid_role(role: &str) -> Self {
        Self::new(
            ErrorCode::ValidationInvalidRole,
            format!("Unknown role '{}', expected 'student' or 'admin'", role),
        )
    }

    /// Duplicate email
    pub fn duplicate_email(email: &str) -> Self {
        Self::new(
            ErrorCode::DbConflict,
            format!("An account for {} already exists", email),
        )
    }

    /// Query failure
    pub fn db(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::DbQueryFailed, msg)
    }

    /// Bad upload filename
    pub fn invalid_filename(name: &str) -> Self {
        Self::new(
            ErrorCode::UploadInvalidFilename,
            format!("Rejected filename '{}'", name),
        )
    }

    /// Stored file missing
    pub fn file_not_found(name: &str) -> Self {
        Self::new(ErrorCode::FileNotFound, format!("No such file: {}", name))
    }

    /// Mail relay failure
    pub fn mail_send_failed(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::MailSendFailed, msg)
    }

    /// API bad request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiBadRequest, msg)
    }

    /// Resource not found
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiNotFound, msg)
    }

    /// API internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(ErrorCode::ApiInternalError, msg)
    }
}

// ============================================
// Result type alias
// ============================================

/// Application Result type
pub type AppResult<T> = Result<T, AppError>;

// ============================================
// Conversion from common error types
// ============================================

impl From<eyre::Report> for AppError {
    fn from(err: eyre::Report) -> Self {
        Self::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::with_source(ErrorCode::FileNotFound, "File not found", err)
        } else {
            Self::with_source(ErrorCode::UploadIoFailed, "IO error", err)
        }
    }
}

impl From<rusqlite::Error> for AppError {
    fn from(err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _) => match e.code {
                rusqlite::ErrorCode::ConstraintViolation => {
                    Self::with_source(ErrorCode::DbConflict, "Constraint violation", err)
                }
                rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked => {
                    Self::with_source(ErrorCode::DbBusy, "Database busy", err)
                }
                _ => Self::with_source(ErrorCode::DbQueryFailed, "Database error", err),
            },
            rusqlite::Error::QueryReturnedNoRows => {
                Self::with_source(ErrorCode::ApiNotFound, "No matching row", err)
            }
            _ => Self::with_source(ErrorCode::DbQueryFailed, "Database error", err),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(ErrorCode::MailSendFailed, "Mail relay timeout")
        } else if err.is_connect() {
            Self::new(ErrorCode::MailSendFailed, "Mail relay unreachable")
        } else {
            Self::new(ErrorCode::Unknown, err.to_string())
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::with_source(ErrorCode::ApiBadRequest, "JSON parse error", err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = AppError::invalid_credentials();
        assert_eq!(err.code, ErrorCode::AuthInvalidCredentials);
        assert_eq!(err.code_str(), "AUTH_INVALID_CREDENTIALS");
    }

    #[test]
    fn test_retryable() {
        assert!(ErrorCode::DbBusy.is_retryable());
        assert!(ErrorCode::MailSendFailed.is_retryable());
        assert!(!ErrorCode::AuthInvalidOtp.is_retryable());
    }

    #[test]
    fn test_http_status() {
        assert_eq!(ErrorCode::ValidationEmptyField.http_status(), 400);
        assert_eq!(ErrorCode::SessionExpired.http_status(), 401);
        assert_eq!(ErrorCode::Forbidden.http_status(), 403);
        assert_eq!(ErrorCode::DbConflict.http_status(), 409);
        assert_eq!(ErrorCode::UploadTooLarge.http_status(), 413);
        assert_eq!(ErrorCode::ApiRateLimited.http_status(), 429);
        assert_eq!(ErrorCode::MailSendFailed.http_status(), 502);
    }

    #[test]
    fn test_display_includes_code() {
        let err = AppError::empty_field("name");
        let rendered = err.to_string();
        assert!(rendered.contains("VALIDATION_EMPTY_FIELD"));
        assert!(rendered.contains("name"));
    }
}
