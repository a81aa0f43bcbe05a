//! Belay Learning Platform Library
//!
//! Backend for a small online-learning product:
//! - Two-step login (password, then OTP) over in-memory sessions
//! - Course content, uploads and student assignment submission
//! - Quiz grading against the full question bank
//! - Contact-form intake for the static marketing site

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod providers;
pub mod seed;
pub mod store;
pub mod telemetry;
pub mod uploads;

pub use api::{create_router, start_cleanup_task, AppState};
pub use auth::{Session, SessionState, SessionStats, SessionStore};
pub use config::{AppConfig, OtpPolicy};
pub use models::{AppError, AppResult, ErrorCode, Role};
pub use providers::Mailer;
pub use seed::{seed_demo, seed_if_empty, SeedSummary};
pub use store::{Store, TableCounts};
pub use telemetry::{TelemetryCollector, UsageEvent, UsageKind, UsageStats};
pub use uploads::Uploads;
