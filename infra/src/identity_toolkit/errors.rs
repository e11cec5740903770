//! Mapping of Identity Toolkit failures onto provider errors

use otp_core::errors::{AuthError, AuthErrorCode, ProviderError};

use super::types::ErrorEnvelope;

/// Map a reason such as `INVALID_CODE` or `TOO_MANY_ATTEMPTS_TRY_LATER : ...`
pub fn map_reason(message: &str) -> AuthErrorCode {
    let reason = message
        .split(|c: char| c == ':' || c.is_whitespace())
        .next()
        .unwrap_or_default();

    match reason {
        "INVALID_CODE" => AuthErrorCode::InvalidVerificationCode,
        "INVALID_SESSION_INFO" | "MISSING_SESSION_INFO" => AuthErrorCode::InvalidVerificationId,
        "SESSION_EXPIRED" | "CODE_EXPIRED" => AuthErrorCode::SessionExpired,
        "INVALID_PHONE_NUMBER" => AuthErrorCode::InvalidPhoneNumber,
        "MISSING_PHONE_NUMBER" => AuthErrorCode::MissingPhoneNumber,
        "QUOTA_EXCEEDED" => AuthErrorCode::QuotaExceeded,
        "TOO_MANY_ATTEMPTS_TRY_LATER" => AuthErrorCode::TooManyRequests,
        "CAPTCHA_CHECK_FAILED" | "MISSING_RECAPTCHA_TOKEN" | "INVALID_RECAPTCHA_TOKEN" => {
            AuthErrorCode::CaptchaCheckFailed
        }
        "USER_DISABLED" => AuthErrorCode::UserDisabled,
        "OPERATION_NOT_ALLOWED" => AuthErrorCode::OperationNotAllowed,
        other => AuthErrorCode::Other(other.to_ascii_lowercase().replace('_', "-")),
    }
}

/// Classify a non-success response body
pub fn error_from_response(status: u16, body: &str) -> ProviderError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            tracing::debug!(
                status = status,
                api_code = envelope.error.code,
                reason = %envelope.error.message,
                event = "identity_toolkit_error",
                "Identity Toolkit rejected the request"
            );
            let code = map_reason(&envelope.error.message);
            AuthError::new(code, envelope.error.message).into()
        }
        Err(_) => ProviderError::Unexpected(anyhow::anyhow!(
            "HTTP {} with undecodable body: {}",
            status,
            truncate(body, 200)
        )),
    }
}

/// Connection, timeout and other transport failures
pub fn error_from_transport(error: &reqwest::Error) -> ProviderError {
    AuthError::new(AuthErrorCode::NetworkRequestFailed, error.to_string()).into()
}

fn truncate(body: &str, max: usize) -> &str {
    match body.char_indices().nth(max) {
        Some((index, _)) => &body[..index],
        None => body,
    }
}
