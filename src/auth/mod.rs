//! Auth Module - Passwords, OTP, Sessions
//!
//! Pure credential logic lives in `password` and `otp`; `session`
//! holds the shared token store. Handlers orchestrate the flow.

pub mod otp;
pub mod password;
pub mod session;

pub use session::{Session, SessionState, SessionStats, SessionStore};
