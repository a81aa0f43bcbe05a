//! Registration, verification and the two-step login flow

use axum::{
    extract::{Json, State},
    Extension,
};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::auth::{otp, password, Session};
use crate::config::OtpPolicy;
use crate::models::{AppError, Role};
use crate::telemetry::{UsageEvent, UsageKind};

use super::super::types::*;
use super::{failure, required_field, ApiFailure, AppState};

/// `POST /v1/auth/register`
///
/// The account row is committed before the verification mail goes out;
/// a relay failure surfaces as 502 but leaves the account registered.
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<RegisterData>>, ApiFailure> {
    let start = Instant::now();

    let name = required_field(start, "name", &req.name)?;
    let email = required_field(start, "email", &req.email)?;
    let raw_password = required_field(start, "password", &req.password)?;
    let role = Role::from_str(req.role.trim())
        .map_err(|_| failure(start, AppError::invalid_role(&req.role)))?;

    let code = otp::issue_code();
    let user = state
        .store
        .create_user(
            name,
            email.clone(),
            password::hash_password(&raw_password),
            role,
            Some(code.clone()),
        )
        .await
        .map_err(|e| failure(start, e))?;

    let verification_sent = match state.mailer.send_verification_code(&email, &code).await {
        Ok(()) => true,
        Err(e) => {
            warn!("⚠️ Verification mail failed for user {}: {}", user.id, e);
            return Err(failure(start, e));
        }
    };

    state.telemetry.record_event(UsageEvent::new(
        UsageKind::Registration,
        start.elapsed().as_millis() as u64,
        format!("role={}", role.as_str()),
    ));
    info!("🆕 REGISTERED: user={} role={}", user.id, role.as_str());

    Ok(Json(ApiResponse::success(
        RegisterData {
            user_id: user.id,
            email,
            verification_sent,
        },
        super::elapsed_ms(start),
    )))
}

/// `POST /v1/auth/verify`
///
/// Exact match against the stored code flips the verified flag;
/// anything else leaves the account untouched.
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyRequest>,
) -> Result<Json<ApiResponse<VerifyData>>, ApiFailure> {
    let start = Instant::now();

    let email = required_field(start, "email", &req.email)?;
    let code = required_field(start, "code", &req.code)?;

    let user = state
        .store
        .user_by_email(email.clone())
        .await
        .map_err(|e| failure(start, e))?;

    // Unknown email and wrong code answer identically; the verify form
    // must not leak which addresses exist.
    let user = match user {
        Some(user) if user.verification_code.as_deref() == Some(code.as_str()) => user,
        _ => return Err(failure(start, AppError::invalid_verification_code())),
    };

    state
        .store
        .mark_verified(user.id)
        .await
        .map_err(|e| failure(start, e))?;

    state.telemetry.record_event(UsageEvent::new(
        UsageKind::Verification,
        start.elapsed().as_millis() as u64,
        "",
    ));
    info!("✅ VERIFIED: user={}", user.id);

    Ok(Json(ApiResponse::success(
        VerifyData {
            email,
            verified: true,
        },
        super::elapsed_ms(start),
    )))
}

/// `POST /v1/auth/login`
///
/// A passing password check issues a pending session; the token only
/// reaches protected routes after the OTP step promotes it.
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginData>>, ApiFailure> {
    let start = Instant::now();

    let email = required_field(start, "email", &req.email)?;

    let user = state
        .store
        .user_by_email(email.clone())
        .await
        .map_err(|e| failure(start, e))?
        .ok_or_else(|| failure(start, AppError::user_not_found()))?;

    if !user.verified {
        return Err(failure(start, AppError::not_verified()));
    }

    if !password::verify_password(&req.password, &user.password_hash) {
        warn!("🚫 LOGIN FAILED: user={}", user.id);
        return Err(failure(start, AppError::invalid_credentials()));
    }

    let issued_code = match state.config.otp_policy {
        OtpPolicy::Issued => Some(otp::issue_code()),
        OtpPolicy::LengthOnly => None,
    };
    let session = state
        .sessions
        .begin(user.id, &user.email, user.role, issued_code.clone());

    if let Some(code) = issued_code {
        if let Err(e) = state.mailer.send_login_code(&user.email, &code).await {
            warn!("⚠️ Login code mail failed for user {}: {}", user.id, e);
            return Err(failure(start, e));
        }
    }

    state.telemetry.record_event(UsageEvent::new(
        UsageKind::Login,
        start.elapsed().as_millis() as u64,
        format!("role={}", user.role.as_str()),
    ));

    Ok(Json(ApiResponse::success(
        LoginData {
            token: session.token,
            otp_required: true,
            role: user.role,
        },
        super::elapsed_ms(start),
    )))
}

/// `POST /v1/auth/otp`
///
/// Second login step. A rejected code leaves the session pending; a
/// passing one promotes it and reports the role so the client can
/// reveal the matching dashboard.
pub async fn otp_step(
    State(state): State<Arc<AppState>>,
    Json(req): Json<OtpRequest>,
) -> Result<Json<ApiResponse<OtpData>>, ApiFailure> {
    let start = Instant::now();

    let pending = state
        .sessions
        .get_pending(&req.token)
        .map_err(|e| failure(start, e))?;

    let accepted = otp::verify(state.config.otp_policy, &req.code, pending.otp_code.as_deref());
    if !accepted {
        let reason = match state.config.otp_policy {
            OtpPolicy::LengthOnly => format!("Code must be exactly {} characters", otp::OTP_LEN),
            OtpPolicy::Issued => "Code does not match".to_string(),
        };
        warn!("🚫 OTP REJECTED: user={}", pending.user_id);
        return Err(failure(start, AppError::invalid_otp(reason)));
    }

    let session = state
        .sessions
        .activate(&req.token)
        .map_err(|e| failure(start, e))?;

    let user = state
        .store
        .user_by_id(session.user_id)
        .await
        .map_err(|e| failure(start, e))?
        .ok_or_else(|| failure(start, AppError::user_not_found()))?;

    state.telemetry.record_event(UsageEvent::new(
        UsageKind::OtpPassed,
        start.elapsed().as_millis() as u64,
        format!("role={}", session.role.as_str()),
    ));

    Ok(Json(ApiResponse::success(
        OtpData {
            token: session.token,
            role: session.role,
            name: user.name,
        },
        super::elapsed_ms(start),
    )))
}

/// `POST /v1/auth/logout`
pub async fn logout(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Json<ApiResponse<LogoutData>> {
    let start = Instant::now();
    let revoked = state.sessions.revoke(&session.token);
    Json(ApiResponse::success(
        LogoutData { revoked },
        super::elapsed_ms(start),
    ))
}

/// `GET /v1/auth/me`
pub async fn me(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<MeData>>, ApiFailure> {
    let start = Instant::now();

    let user = state
        .store
        .user_by_id(session.user_id)
        .await
        .map_err(|e| failure(start, e))?
        .ok_or_else(|| failure(start, AppError::user_not_found()))?;

    Ok(Json(ApiResponse::success(
        MeData {
            user_id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            session_expires_in: session.remaining_ttl(),
        },
        super::elapsed_ms(start),
    )))
}

/// `GET /v1/dashboard`
///
/// Role-shaped payload: students see their submissions and attempt
/// history, admins see the platform counters.
pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<ApiResponse<DashboardData>>, ApiFailure> {
    let start = Instant::now();

    let user = state
        .store
        .user_by_id(session.user_id)
        .await
        .map_err(|e| failure(start, e))?
        .ok_or_else(|| failure(start, AppError::user_not_found()))?;

    let courses = state
        .store
        .list_courses()
        .await
        .map_err(|e| failure(start, e))?;

    let data = match user.role {
        Role::Student => {
            let assignments = state
                .store
                .assignments_by_student(user.id)
                .await
                .map_err(|e| failure(start, e))?;
            let quiz_results = state
                .store
                .quiz_results_by_student(user.id)
                .await
                .map_err(|e| failure(start, e))?;
            DashboardData {
                name: user.name,
                email: user.email,
                role: user.role,
                courses,
                assignments: Some(assignments),
                quiz_results: Some(quiz_results),
                platform: None,
            }
        }
        Role::Admin => {
            let platform = state.store.counts().await.map_err(|e| failure(start, e))?;
            DashboardData {
                name: user.name,
                email: user.email,
                role: user.role,
                courses,
                assignments: None,
                quiz_results: None,
                platform: Some(platform),
            }
        }
    };

    Ok(Json(ApiResponse::success(data, super::elapsed_ms(start))))
}
