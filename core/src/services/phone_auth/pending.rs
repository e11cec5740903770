//! Pending verification material held between code dispatch and verify

use std::sync::Arc;

use crate::domain::{LoginResult, PhoneAuthCredential, VerificationId};
use crate::errors::ProviderResult;

use super::traits::{AuthProvider, ConfirmationHandle};
use super::types::PendingKind;

/// What the session needs to turn a user's code into a login
#[derive(Clone)]
pub enum PendingVerification {
    /// Id issued by the provider, paired with the code into a credential
    Token(VerificationId),
    /// Provider object that accepts the code itself
    Confirmation(Arc<dyn ConfirmationHandle>),
}

/// Material ready for login finalization
#[derive(Debug)]
pub enum Completion {
    /// Still has to be exchanged with the provider
    Credential(PhoneAuthCredential),
    /// Already exchanged
    SignedIn(LoginResult),
}

impl PendingVerification {
    pub fn kind(&self) -> PendingKind {
        match self {
            PendingVerification::Token(_) => PendingKind::Token,
            PendingVerification::Confirmation(_) => PendingKind::Confirmation,
        }
    }

    pub fn verification_id(&self) -> Option<VerificationId> {
        match self {
            PendingVerification::Token(id) => Some(id.clone()),
            PendingVerification::Confirmation(handle) => handle.verification_id(),
        }
    }

    /// Combine this pending material with the user's code
    pub async fn complete(
        &self,
        provider: &dyn AuthProvider,
        code: &str,
    ) -> ProviderResult<Completion> {
        match self {
            PendingVerification::Token(verification_id) => Ok(Completion::Credential(
                provider.build_credential(verification_id, code),
            )),
            PendingVerification::Confirmation(handle) => {
                handle.confirm(code).await.map(Completion::SignedIn)
            }
        }
    }
}

impl std::fmt::Debug for PendingVerification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingVerification::Token(id) => f.debug_tuple("Token").field(id).finish(),
            PendingVerification::Confirmation(_) => f.write_str("Confirmation(..)"),
        }
    }
}
