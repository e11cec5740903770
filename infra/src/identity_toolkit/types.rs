//! Request and response bodies of the Identity Toolkit REST API

use serde::{Deserialize, Serialize};

use otp_core::domain::{AuthUser, LoginResult};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendVerificationCodeRequest<'a> {
    pub phone_number: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recaptcha_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendVerificationCodeResponse {
    pub session_info: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInWithPhoneNumberRequest<'a> {
    pub session_info: &'a str,
    pub code: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInWithPhoneNumberResponse {
    pub id_token: String,
    pub refresh_token: String,
    /// Seconds, sent as a decimal string
    #[serde(default)]
    pub expires_in: Option<String>,
    pub local_id: String,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub is_new_user: bool,
}

impl SignInWithPhoneNumberResponse {
    pub fn into_login_result(self) -> LoginResult {
        let user = AuthUser::new(self.local_id, self.phone_number.unwrap_or_default());
        LoginResult {
            user,
            id_token: Some(self.id_token),
            refresh_token: Some(self.refresh_token),
            expires_in: self.expires_in.and_then(|secs| secs.parse().ok()),
            is_new_user: self.is_new_user,
        }
    }
}

/// `{"error": {"code": 400, "message": "INVALID_CODE"}}`
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
}
