//! OTP and verification-code generation and checking
//!
//! Two policies exist for the login second step:
//! - `LengthOnly`: any six-character code passes. This keeps demo
//!   deployments usable without a mail relay.
//! - `Issued`: the code mailed for this pending session must match.
//!
//! Registration email verification always compares the issued code,
//! regardless of policy.

use rand::Rng;

use crate::config::OtpPolicy;

/// Number of characters the login step expects
pub const OTP_LEN: usize = 6;

/// Generate a six-digit numeric code, `100000..=999999`
pub fn issue_code() -> String {
    rand::thread_rng().gen_range(100_000..=999_999).to_string()
}

/// Check a submitted login OTP against the active policy
///
/// `issued` is the code generated at login time, present only when a
/// mail-backed policy issued one.
pub fn verify(policy: OtpPolicy, submitted: &str, issued: Option<&str>) -> bool {
    match policy {
        // Characters, not bytes: a six-letter code must pass even when
        // it contains non-ASCII characters.
        OtpPolicy::LengthOnly => submitted.chars().count() == OTP_LEN,
        OtpPolicy::Issued => issued.is_some_and(|code| code == submitted),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_code_shape() {
        for _ in 0..32 {
            let code = issue_code();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(code.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn test_length_only_counts_chars() {
        let policy = OtpPolicy::LengthOnly;
        assert!(verify(policy, "123456", None));
        assert!(verify(policy, "abcdef", None));
        assert!(verify(policy, "áéíóúñ", None));
        assert!(!verify(policy, "12345", None));
        assert!(!verify(policy, "1234567", None));
        assert!(!verify(policy, "", None));
    }

    #[test]
    fn test_issued_requires_exact_match() {
        let policy = OtpPolicy::Issued;
        assert!(verify(policy, "654321", Some("654321")));
        assert!(!verify(policy, "654321", Some("654322")));
        assert!(!verify(policy, "654321", None));
        // A valid length is not enough under the issued policy
        assert!(!verify(policy, "000000", Some("654321")));
    }
}
