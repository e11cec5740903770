//! `AuthProvider` implementation over the Identity Toolkit REST API

use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use otp_core::domain::{AuthUser, LoginResult, PhoneAuthCredential, VerificationId};
use otp_core::errors::{AuthError, AuthErrorCode, ProviderResult};
use otp_core::services::phone_auth::{
    verification_channel, AuthProvider, ConfirmationHandle, HumanVerifier,
    PhoneVerificationEvent, PhoneVerificationRequest, VerificationEvents,
};
use otp_shared::phone::mask_phone_number;

use super::client::IdentityToolkitClient;
use super::config::IdentityToolkitConfig;
use crate::InfrastructureError;

type SignedInUser = Arc<Mutex<Option<AuthUser>>>;

fn remember(signed_in: &SignedInUser, result: &LoginResult) {
    *signed_in.lock().unwrap_or_else(PoisonError::into_inner) = Some(result.user.clone());
}

/// Identity Toolkit provider.
///
/// The REST API has no SMS auto-retrieval: id-correlated verification
/// reports `CodeSent` once the request succeeds, and request failures are
/// returned from the initiating call.
pub struct IdentityToolkitProvider {
    client: Arc<IdentityToolkitClient>,
    signed_in: SignedInUser,
}

impl IdentityToolkitProvider {
    pub fn new(config: IdentityToolkitConfig) -> Result<Self, InfrastructureError> {
        tracing::info!(
            base_url = %config.base_url,
            event = "identity_toolkit_initialized",
            "Identity Toolkit provider initialized"
        );
        Ok(Self {
            client: Arc::new(IdentityToolkitClient::new(config)?),
            signed_in: Arc::new(Mutex::new(None)),
        })
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self, InfrastructureError> {
        Self::new(IdentityToolkitConfig::from_env()?)
    }

    /// User of the most recent successful sign-in, until `sign_out`
    pub fn current_user(&self) -> Option<AuthUser> {
        self.signed_in
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl AuthProvider for IdentityToolkitProvider {
    async fn begin_phone_verification(
        &self,
        request: PhoneVerificationRequest,
    ) -> ProviderResult<VerificationEvents> {
        if request.resend_token.is_some() {
            tracing::debug!(
                phone = %mask_phone_number(&request.phone_number),
                event = "resend_token_ignored",
                "Identity Toolkit has no resend path; sending a fresh code"
            );
        }

        let recaptcha = self.client.config().recaptcha_token.as_deref();
        let verification_id = self
            .client
            .send_verification_code(&request.phone_number, recaptcha)
            .await?;

        let (sender, events) = verification_channel();
        // The receiver is still held here, so this cannot fail.
        let _ = sender.send(PhoneVerificationEvent::CodeSent {
            verification_id,
            resend_token: None,
        });
        Ok(events)
    }

    async fn begin_interactive_verification(
        &self,
        phone_number: &str,
        verifier: Option<Arc<dyn HumanVerifier>>,
    ) -> ProviderResult<Arc<dyn ConfirmationHandle>> {
        let token = match verifier {
            Some(verifier) => Some(verifier.token().await?),
            None => self.client.config().recaptcha_token.clone(),
        };
        let session_info = self
            .client
            .send_verification_code(phone_number, token.as_deref())
            .await?;

        Ok(Arc::new(IdentityToolkitConfirmation {
            client: Arc::clone(&self.client),
            session_info,
            signed_in: Arc::clone(&self.signed_in),
        }))
    }

    async fn sign_in_with_credential(
        &self,
        credential: PhoneAuthCredential,
    ) -> ProviderResult<LoginResult> {
        match credential {
            PhoneAuthCredential::Code {
                verification_id,
                code,
            } => {
                let result = self
                    .client
                    .sign_in_with_phone_number(verification_id.as_str(), &code)
                    .await?;
                remember(&self.signed_in, &result);
                Ok(result)
            }
            PhoneAuthCredential::Provider { provider_id, .. } => Err(AuthError::new(
                AuthErrorCode::OperationNotAllowed,
                format!("Credentials from '{}' cannot be exchanged over REST", provider_id),
            )
            .into()),
        }
    }

    async fn sign_out(&self) -> ProviderResult<()> {
        let previous = self
            .signed_in
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        tracing::info!(
            had_user = previous.is_some(),
            event = "identity_toolkit_sign_out",
            "Discarded signed-in user"
        );
        Ok(())
    }
}

/// Confirmation handle bound to one `sendVerificationCode` session
pub struct IdentityToolkitConfirmation {
    client: Arc<IdentityToolkitClient>,
    session_info: VerificationId,
    signed_in: SignedInUser,
}

#[async_trait]
impl ConfirmationHandle for IdentityToolkitConfirmation {
    async fn confirm(&self, code: &str) -> ProviderResult<LoginResult> {
        let result = self
            .client
            .sign_in_with_phone_number(self.session_info.as_str(), code)
            .await?;
        remember(&self.signed_in, &result);
        Ok(result)
    }

    fn verification_id(&self) -> Option<VerificationId> {
        Some(self.session_info.clone())
    }
}
