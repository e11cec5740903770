//! Error types for the phone auth session and its provider contract.

mod types;


pub use types::{AuthError, AuthErrorCode};

use thiserror::Error;

/// Failure returned by any provider call
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Structured failure, forwarded to the login-failure callback
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Anything the provider did not classify
    #[error("Unexpected provider failure: {0}")]
    Unexpected(#[from] anyhow::Error),
}

impl ProviderError {
    /// Wrap an arbitrary message as an unclassified failure
    pub fn unexpected(message: impl std::fmt::Display) -> Self {
        ProviderError::Unexpected(anyhow::anyhow!("{}", message))
    }

    /// The structured error, if this is one
    pub fn as_auth(&self) -> Option<&AuthError> {
        match self {
            ProviderError::Auth(error) => Some(error),
            ProviderError::Unexpected(_) => None,
        }
    }
}

/// Errors raised synchronously by session configuration
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Phone number is required")]
    MissingPhoneNumber,

    #[error("Invalid phone number format: {phone}")]
    InvalidPhoneNumber { phone: String },

    #[error("Timeout of {seconds}s exceeds the maximum of {max}s")]
    TimeoutTooLong { seconds: u64, max: u64 },
}

pub type ProviderResult<T> = Result<T, ProviderError>;
pub type SessionResult<T> = Result<T, SessionError>;
