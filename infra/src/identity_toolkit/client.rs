//! Thin HTTP client for the two phone endpoints

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use otp_core::domain::{LoginResult, VerificationId};
use otp_core::errors::{ProviderError, ProviderResult};
use otp_shared::phone::mask_phone_number;

use super::config::IdentityToolkitConfig;
use super::errors::{error_from_response, error_from_transport};
use super::types::{
    SendVerificationCodeRequest, SendVerificationCodeResponse, SignInWithPhoneNumberRequest,
    SignInWithPhoneNumberResponse,
};
use crate::InfrastructureError;

pub struct IdentityToolkitClient {
    http: reqwest::Client,
    config: IdentityToolkitConfig,
}

impl IdentityToolkitClient {
    pub fn new(config: IdentityToolkitConfig) -> Result<Self, InfrastructureError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &IdentityToolkitConfig {
        &self.config
    }

    /// `accounts:sendVerificationCode`; returns the session info
    pub async fn send_verification_code(
        &self,
        phone_number: &str,
        recaptcha_token: Option<&str>,
    ) -> ProviderResult<VerificationId> {
        tracing::debug!(
            phone = %mask_phone_number(phone_number),
            has_recaptcha_token = recaptcha_token.is_some(),
            event = "identity_toolkit_send_code",
            "Requesting verification code"
        );
        let response: SendVerificationCodeResponse = self
            .post(
                "sendVerificationCode",
                &SendVerificationCodeRequest {
                    phone_number,
                    recaptcha_token,
                },
            )
            .await?;
        Ok(VerificationId::new(response.session_info))
    }

    /// `accounts:signInWithPhoneNumber`
    pub async fn sign_in_with_phone_number(
        &self,
        session_info: &str,
        code: &str,
    ) -> ProviderResult<LoginResult> {
        let response: SignInWithPhoneNumberResponse = self
            .post(
                "signInWithPhoneNumber",
                &SignInWithPhoneNumberRequest { session_info, code },
            )
            .await?;
        Ok(response.into_login_result())
    }

    async fn post<B, R>(&self, method: &str, body: &B) -> ProviderResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.config.endpoint(method))
            .json(body)
            .send()
            .await
            .map_err(|e| error_from_transport(&e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| error_from_transport(&e))?;

        if !status.is_success() {
            return Err(error_from_response(status.as_u16(), &text));
        }

        serde_json::from_str(&text).map_err(|e| {
            ProviderError::Unexpected(anyhow::Error::new(e).context(format!(
                "Undecodable accounts:{} response",
                method
            )))
        })
    }
}
