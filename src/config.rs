//! Configuration module for the Belay platform server
//! Every tunable lives here and is read from the environment once at startup

use std::time::Duration;

/// How the login OTP step checks the submitted code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OtpPolicy {
    /// Accept any code of exactly six characters
    LengthOnly,
    /// Accept only the code issued and mailed for this session
    Issued,
}

impl OtpPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OtpPolicy::LengthOnly => "length-only",
            OtpPolicy::Issued => "issued",
        }
    }
}

/// Configuration for the platform server
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Bind host
    pub host: String,

    /// Bind port (reads PORT first for PaaS deploys)
    pub port: u16,

    /// SQLite database file path
    pub database_path: String,

    /// Directory for course files and assignment uploads
    pub upload_dir: String,

    /// Directory served at `/` for the marketing and dashboard pages
    pub static_dir: String,

    /// Directory for telemetry exports written on shutdown
    pub telemetry_dir: String,

    /// Lifetime of an active session after the OTP step
    pub session_ttl: Duration,

    /// Lifetime of a pending session between login and OTP
    pub pending_ttl: Duration,

    /// OTP verification mode
    pub otp_policy: OtpPolicy,

    /// Seed demo accounts and content into an empty database
    pub demo_seed: bool,

    /// Max requests per client per window
    pub rate_limit_max: u32,

    /// Rate limit window length
    pub rate_limit_window: Duration,

    /// Reject multipart uploads larger than this
    pub max_upload_bytes: usize,

    /// HTTP mail relay endpoint; unset means log-only delivery
    pub mail_relay_url: Option<String>,

    /// Bearer key for the mail relay
    pub mail_api_key: Option<String>,

    /// From address on outbound mail
    pub mail_from: String,

    /// Timeout for relay calls
    pub mail_timeout: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: env_or("BELAY_HOST", "0.0.0.0"),
            port: std::env::var("PORT")
                .or_else(|_| std::env::var("BELAY_PORT"))
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            database_path: env_or("BELAY_DB", "belay.db"),
            upload_dir: env_or("BELAY_UPLOAD_DIR", "uploads"),
            static_dir: env_or("BELAY_STATIC_DIR", "static"),
            telemetry_dir: env_or("BELAY_TELEMETRY_DIR", "telemetry"),
            session_ttl: Duration::from_secs(env_parse("BELAY_SESSION_TTL_SECS", 3600)),
            pending_ttl: Duration::from_secs(env_parse("BELAY_PENDING_TTL_SECS", 300)),
            otp_policy: match env_or("BELAY_OTP_POLICY", "length").as_str() {
                "issued" => OtpPolicy::Issued,
                _ => OtpPolicy::LengthOnly,
            },
            demo_seed: env_parse("BELAY_DEMO_SEED", 1u8) != 0,
            rate_limit_max: env_parse("BELAY_RATE_LIMIT_MAX", 120),
            rate_limit_window: Duration::from_secs(env_parse("BELAY_RATE_LIMIT_WINDOW_SECS", 60)),
            max_upload_bytes: env_parse("BELAY_MAX_UPLOAD_BYTES", 10 * 1024 * 1024),
            mail_relay_url: std::env::var("BELAY_MAIL_RELAY_URL")
                .ok()
                .filter(|u| !u.is_empty()),
            mail_api_key: std::env::var("BELAY_MAIL_API_KEY")
                .ok()
                .filter(|k| !k.is_empty()),
            mail_from: env_or("BELAY_MAIL_FROM", "no-reply@belay.edu"),
            mail_timeout: Duration::from_secs(env_parse("BELAY_MAIL_TIMEOUT_SECS", 5)),
        }
    }
}

impl AppConfig {
    /// Socket address string for the listener
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse<T: std::str::FromStr + Copy>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_without_env() {
        let cfg = AppConfig::default();
        assert!(!cfg.bind_addr().is_empty());
        assert_eq!(cfg.otp_policy, OtpPolicy::LengthOnly);
        assert!(cfg.max_upload_bytes > 0);
    }

    #[test]
    fn test_env_parse_falls_back_on_garbage() {
        std::env::set_var("BELAY_TEST_PARSE_GARBAGE", "not-a-number");
        assert_eq!(env_parse::<u64>("BELAY_TEST_PARSE_GARBAGE", 42), 42);
        std::env::remove_var("BELAY_TEST_PARSE_GARBAGE");
    }

    #[test]
    fn test_otp_policy_names() {
        assert_eq!(OtpPolicy::LengthOnly.as_str(), "length-only");
        assert_eq!(OtpPolicy::Issued.as_str(), "issued");
    }
}
