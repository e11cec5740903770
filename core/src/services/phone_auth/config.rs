//! Per-session options passed to `configure`

use std::sync::Arc;
use std::time::Duration;

use crate::domain::LoginResult;
use crate::errors::AuthError;

use super::traits::HumanVerifier;
use super::types::Callbacks;

/// Longest verification window a session accepts, in seconds
pub const MAX_TIMEOUT_SECS: u64 = 3600;

/// Options for one login attempt: phone number, callbacks and policy.
///
/// Unset `timeout` and `sign_out_on_success` fall back to the session's
/// process-wide settings.
#[derive(Clone)]
pub struct SessionOptions {
    pub(crate) phone_number: String,
    pub(crate) callbacks: Callbacks,
    pub(crate) sign_out_on_success: Option<bool>,
    pub(crate) timeout: Option<Duration>,
    pub(crate) verifier: Option<Arc<dyn HumanVerifier>>,
}

impl SessionOptions {
    pub fn new(phone_number: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            callbacks: Callbacks::default(),
            sign_out_on_success: None,
            timeout: None,
            verifier: None,
        }
    }

    /// Called once the provider confirms the code was dispatched
    pub fn on_code_sent<F>(mut self, callback: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.callbacks.on_code_sent = Some(Arc::new(callback));
        self
    }

    /// Called with the login result and whether it was auto-verified
    pub fn on_login_success<F>(mut self, callback: F) -> Self
    where
        F: Fn(&LoginResult, bool) + Send + Sync + 'static,
    {
        self.callbacks.on_login_success = Some(Arc::new(callback));
        self
    }

    /// Called with every structured provider failure
    pub fn on_login_failed<F>(mut self, callback: F) -> Self
    where
        F: Fn(&AuthError) + Send + Sync + 'static,
    {
        self.callbacks.on_login_failed = Some(Arc::new(callback));
        self
    }

    /// Sign out of the provider right after a successful login
    pub fn sign_out_on_success(mut self, sign_out: bool) -> Self {
        self.sign_out_on_success = Some(sign_out);
        self
    }

    /// Verification window length
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Human verification widget for interactive verification
    pub fn verifier(mut self, verifier: Arc<dyn HumanVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }
}

impl std::fmt::Debug for SessionOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionOptions")
            .field("phone_number", &otp_shared::phone::mask_phone_number(&self.phone_number))
            .field("sign_out_on_success", &self.sign_out_on_success)
            .field("timeout", &self.timeout)
            .field("has_verifier", &self.verifier.is_some())
            .finish_non_exhaustive()
    }
}
