//! Outbound Mail Client
//!
//! Two transports:
//! - `LogOnly` (default): deliveries are written to the log. Demo
//!   deployments have no relay, and the verification code has to be
//!   visible somewhere.
//! - `HttpRelay`: POSTs a JSON message to a relay endpoint with an
//!   optional bearer key.
//!
//! The relay wire shape: `{"from": .., "to": .., "subject": .., "text": ..}`

use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::models::{AppError, AppResult, ErrorCode};

/// How mail leaves the process
#[derive(Debug, Clone)]
pub enum MailTransport {
    LogOnly,
    HttpRelay { url: String, api_key: Option<String> },
}

/// Outbound message payload for the relay
#[derive(Debug, Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// Mail client shared across handlers
#[derive(Clone, Debug)]
pub struct Mailer {
    transport: MailTransport,
    client: reqwest::Client,
    from: String,
}

impl Mailer {
    /// Build from config; validates the relay URL up front
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        let transport = match &config.mail_relay_url {
            Some(url) => {
                reqwest::Url::parse(url).map_err(|e| {
                    AppError::with_source(
                        ErrorCode::MailRelayMisconfigured,
                        format!("bad relay URL '{}'", url),
                        e,
                    )
                })?;
                info!("📧 MAIL: http relay at {}", url);
                MailTransport::HttpRelay {
                    url: url.clone(),
                    api_key: config.mail_api_key.clone(),
                }
            }
            None => {
                info!("📧 MAIL: log-only delivery (no relay configured)");
                MailTransport::LogOnly
            }
        };

        let client = reqwest::Client::builder()
            .timeout(config.mail_timeout)
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorCode::MailRelayMisconfigured, "mail client build", e)
            })?;

        Ok(Self {
            transport,
            client,
            from: config.mail_from.clone(),
        })
    }

    /// Client with a fixed transport, for tests and the seed tool
    pub fn log_only(from: impl Into<String>) -> Self {
        Self {
            transport: MailTransport::LogOnly,
            client: reqwest::Client::new(),
            from: from.into(),
        }
    }

    /// Send one message; relay failures surface as MAIL_SEND_FAILED
    pub async fn send(&self, to: &str, subject: &str, text: &str) -> AppResult<()> {
        match &self.transport {
            MailTransport::LogOnly => {
                info!("📨 MAIL (log-only) to={} subject={:?}\n{}", to, subject, text);
                Ok(())
            }
            MailTransport::HttpRelay { url, api_key } => {
                let message = RelayMessage {
                    from: &self.from,
                    to,
                    subject,
                    text,
                };
                let mut request = self.client.post(url).json(&message);
                if let Some(key) = api_key {
                    request = request.bearer_auth(key);
                }
                let response = request.send().await.map_err(|e| {
                    warn!("⚠️ MAIL relay unreachable: {}", e);
                    AppError::mail_send_failed(format!("relay request failed: {}", e))
                })?;
                if !response.status().is_success() {
                    warn!("⚠️ MAIL relay rejected: {}", response.status());
                    return Err(AppError::mail_send_failed(format!(
                        "relay answered {}",
                        response.status()
                    )));
                }
                info!("📨 MAIL SENT to={} subject={:?}", to, subject);
                Ok(())
            }
        }
    }

    /// Registration verification mail
    pub async fn send_verification_code(&self, to: &str, code: &str) -> AppResult<()> {
        self.send(
            to,
            "Verify your Belay account",
            &format!("Your verification code is {}. Enter it to finish signing up.", code),
        )
        .await
    }

    /// Login OTP mail under the issued policy
    pub async fn send_login_code(&self, to: &str, code: &str) -> AppResult<()> {
        self.send(
            to,
            "Your Belay login code",
            &format!("Your one-time login code is {}. It expires shortly.", code),
        )
        .await
    }
}
