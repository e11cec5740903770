//! Traits for provider integration and countdown ticking

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{LoginResult, PhoneAuthCredential, VerificationId};
use crate::errors::{AuthError, AuthErrorCode, ProviderResult};

use super::types::{PhoneVerificationRequest, VerificationEvents};

/// Capability surface of the external authentication provider
#[async_trait]
pub trait AuthProvider: Send + Sync {
    /// Start id-correlated verification.
    ///
    /// Outcomes arrive on the returned channel, in any order and possibly
    /// never: auto-verification, failure, code dispatch and the
    /// auto-retrieval timeout.
    async fn begin_phone_verification(
        &self,
        request: PhoneVerificationRequest,
    ) -> ProviderResult<VerificationEvents>;

    /// Start verification on platforms that require an interactive human
    /// check; the returned handle accepts the user's code
    async fn begin_interactive_verification(
        &self,
        phone_number: &str,
        verifier: Option<Arc<dyn HumanVerifier>>,
    ) -> ProviderResult<Arc<dyn ConfirmationHandle>> {
        let _ = (phone_number, verifier);
        Err(AuthError::new(
            AuthErrorCode::OperationNotAllowed,
            "Interactive phone verification is not supported by this provider",
        )
        .into())
    }

    /// Pair a verification id with a user-entered code
    fn build_credential(&self, verification_id: &VerificationId, code: &str) -> PhoneAuthCredential {
        PhoneAuthCredential::from_code(verification_id.clone(), code)
    }

    /// Exchange a credential for a signed-in user
    async fn sign_in_with_credential(
        &self,
        credential: PhoneAuthCredential,
    ) -> ProviderResult<LoginResult>;

    /// End the provider-side session
    async fn sign_out(&self) -> ProviderResult<()>;
}

/// Provider object returned by interactive verification
#[async_trait]
pub trait ConfirmationHandle: Send + Sync {
    /// Submit the user's code; resolves to the signed-in user
    async fn confirm(&self, code: &str) -> ProviderResult<LoginResult>;

    /// Verification id behind this handle, when the provider exposes it
    fn verification_id(&self) -> Option<VerificationId> {
        None
    }
}

/// Provider-specific human verification widget (CAPTCHA or similar)
#[async_trait]
pub trait HumanVerifier: Send + Sync {
    /// Produce a verification token for the provider
    async fn token(&self) -> ProviderResult<String>;

    /// Free the widget; called once when the session is cleared
    fn release(&self);
}

/// A periodic tick stream
#[async_trait]
pub trait Ticker: Send {
    /// Wait for the next tick
    async fn tick(&mut self);
}

/// Factory for tickers, injected so tests can drive time by hand
pub trait TickSource: Send + Sync {
    /// Create a ticker whose first tick fires one `period` from now
    fn ticker(&self, period: Duration) -> Box<dyn Ticker>;
}
