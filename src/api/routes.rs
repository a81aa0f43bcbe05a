//! API Route Configuration

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    services::ServeDir,
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use super::handlers::{self, AppState};
use super::middleware::{logging_middleware, rate_limit_middleware, session_middleware};

/// Create the full router: public routes, session-protected routes,
/// the static marketing site as fallback, and the middleware stack
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Routes reachable without a session
    let public = Router::new()
        .route("/health", get(handlers::system::health_check))
        .route("/v1/health", get(handlers::system::health_check))
        .route("/contact", post(handlers::contact::submit))
        .route("/v1/auth/register", post(handlers::auth::register))
        .route("/v1/auth/verify", post(handlers::auth::verify_email))
        .route("/v1/auth/login", post(handlers::auth::login))
        .route("/v1/auth/otp", post(handlers::auth::otp_step));

    // Routes behind an active session (post-OTP)
    let protected = Router::new()
        .route("/v1/auth/logout", post(handlers::auth::logout))
        .route("/v1/auth/me", get(handlers::auth::me))
        .route("/v1/dashboard", get(handlers::auth::dashboard))
        .route("/v1/content", get(handlers::courses::content))
        .route(
            "/v1/courses",
            get(handlers::courses::list).post(handlers::courses::create),
        )
        .route(
            "/v1/courses/:id/assignments",
            post(handlers::assignments::submit),
        )
        .route("/v1/assignments/mine", get(handlers::assignments::mine))
        .route("/v1/quizzes", get(handlers::quizzes::list))
        .route("/v1/quizzes/submit", post(handlers::quizzes::submit))
        .route("/v1/uploads/:filename", get(handlers::courses::download))
        .route("/v1/chatbot", post(handlers::chatbot::prompt))
        .route("/v1/contact/messages", get(handlers::contact::inbox))
        .route("/v1/stats", get(handlers::system::get_stats))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            session_middleware,
        ));

    let max_upload_bytes = state.config.max_upload_bytes;
    let static_dir = state.config.static_dir.clone();

    // Build full router
    Router::new()
        .merge(public)
        .merge(protected)
        // Marketing site: anything unmatched is served from static_dir
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state.clone())
        // Middleware (order matters - bottom runs first)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(30)))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(middleware::from_fn_with_state(state, logging_middleware))
        .layer(middleware::from_fn(rate_limit_middleware))
}
