//! Opaque values the provider hands out during phone verification.

use serde::{Deserialize, Serialize};

/// Identifier issued on code dispatch; paired with the user's code to
/// build a credential
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerificationId(String);

impl VerificationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VerificationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VerificationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Token that lets the provider take its faster resend path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResendToken(String);

impl ResendToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Credential exchanged with the provider for a login result
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PhoneAuthCredential {
    /// Verification id plus the code the user typed
    Code {
        verification_id: VerificationId,
        code: String,
    },
    /// Credential obtained without user input (instant verification or
    /// automatic SMS retrieval); contents are provider-defined
    Provider { provider_id: String, token: String },
}

impl PhoneAuthCredential {
    /// Pair a verification id with a user-entered code
    pub fn from_code(verification_id: VerificationId, code: impl Into<String>) -> Self {
        PhoneAuthCredential::Code {
            verification_id,
            code: code.into(),
        }
    }
}

// Codes stay out of logs.
impl std::fmt::Debug for PhoneAuthCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PhoneAuthCredential::Code {
                verification_id, ..
            } => f
                .debug_struct("Code")
                .field("verification_id", verification_id)
                .field("code", &"******")
                .finish(),
            PhoneAuthCredential::Provider { provider_id, .. } => f
                .debug_struct("Provider")
                .field("provider_id", provider_id)
                .finish_non_exhaustive(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_code() {
        let credential = PhoneAuthCredential::from_code(VerificationId::new("abc"), "123456");
        let rendered = format!("{:?}", credential);
        assert!(rendered.contains("abc"));
        assert!(!rendered.contains("123456"));
    }
}
