//! Providers Module - External Services
//!
//! Outbound integrations live here; today that is the mail relay.

pub mod mailer;

pub use mailer::{MailTransport, Mailer};
