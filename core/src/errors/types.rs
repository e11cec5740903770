//! Structured errors reported by the authentication provider

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reason codes the provider attaches to a structured failure
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuthErrorCode {
    /// The submitted code does not match
    InvalidVerificationCode,
    /// The verification id is malformed or unknown
    InvalidVerificationId,
    /// The verification window has closed on the provider side
    SessionExpired,
    /// The phone number was rejected by the provider
    InvalidPhoneNumber,
    /// No phone number was supplied
    MissingPhoneNumber,
    /// The project's SMS quota is exhausted
    QuotaExceeded,
    /// Too many requests from this device or number
    TooManyRequests,
    /// Human verification (CAPTCHA) failed or expired
    CaptchaCheckFailed,
    /// The provider could not be reached
    NetworkRequestFailed,
    /// The account behind this number is disabled
    UserDisabled,
    /// Phone sign-in is not enabled for the project
    OperationNotAllowed,
    /// Any other reason string, kept verbatim
    Other(String),
}

impl AuthErrorCode {
    /// Stable kebab-case identifier for this code
    pub fn as_str(&self) -> &str {
        match self {
            AuthErrorCode::InvalidVerificationCode => "invalid-verification-code",
            AuthErrorCode::InvalidVerificationId => "invalid-verification-id",
            AuthErrorCode::SessionExpired => "session-expired",
            AuthErrorCode::InvalidPhoneNumber => "invalid-phone-number",
            AuthErrorCode::MissingPhoneNumber => "missing-phone-number",
            AuthErrorCode::QuotaExceeded => "quota-exceeded",
            AuthErrorCode::TooManyRequests => "too-many-requests",
            AuthErrorCode::CaptchaCheckFailed => "captcha-check-failed",
            AuthErrorCode::NetworkRequestFailed => "network-request-failed",
            AuthErrorCode::UserDisabled => "user-disabled",
            AuthErrorCode::OperationNotAllowed => "operation-not-allowed",
            AuthErrorCode::Other(code) => code,
        }
    }

    /// Whether asking for a fresh code is the sensible next step
    pub fn requires_new_code(&self) -> bool {
        matches!(
            self,
            AuthErrorCode::SessionExpired | AuthErrorCode::InvalidVerificationId
        )
    }
}

impl std::fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuthErrorCode {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = match s {
            "invalid-verification-code" => AuthErrorCode::InvalidVerificationCode,
            "invalid-verification-id" => AuthErrorCode::InvalidVerificationId,
            "session-expired" => AuthErrorCode::SessionExpired,
            "invalid-phone-number" => AuthErrorCode::InvalidPhoneNumber,
            "missing-phone-number" => AuthErrorCode::MissingPhoneNumber,
            "quota-exceeded" => AuthErrorCode::QuotaExceeded,
            "too-many-requests" => AuthErrorCode::TooManyRequests,
            "captcha-check-failed" => AuthErrorCode::CaptchaCheckFailed,
            "network-request-failed" => AuthErrorCode::NetworkRequestFailed,
            "user-disabled" => AuthErrorCode::UserDisabled,
            "operation-not-allowed" => AuthErrorCode::OperationNotAllowed,
            other => AuthErrorCode::Other(other.to_string()),
        };
        Ok(code)
    }
}

/// A failure the provider classified with a reason code.
///
/// This is the only error shape forwarded to the login-failure callback.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("{code}: {message}")]
pub struct AuthError {
    /// Reason code
    pub code: AuthErrorCode,
    /// Human-readable detail from the provider
    pub message: String,
}

impl AuthError {
    /// Create a new structured error
    pub fn new(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The submitted code was wrong
    pub fn invalid_code() -> Self {
        Self::new(
            AuthErrorCode::InvalidVerificationCode,
            "The verification code is invalid",
        )
    }

    /// The provider's verification window has closed
    pub fn session_expired() -> Self {
        Self::new(
            AuthErrorCode::SessionExpired,
            "The verification session has expired, request a new code",
        )
    }
}
