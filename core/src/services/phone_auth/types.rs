//! Types exchanged between the session, the provider and observers

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::domain::{LoginResult, PhoneAuthCredential, ResendToken, VerificationId};
use crate::errors::AuthError;

/// Parameters for id-correlated verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhoneVerificationRequest {
    /// E.164 phone number
    pub phone_number: String,
    /// How long the provider should wait for automatic SMS retrieval
    pub timeout: Duration,
    /// Resend token from the previous code dispatch, if any
    pub resend_token: Option<ResendToken>,
}

/// Asynchronous outcome of id-correlated verification
#[derive(Debug, Clone)]
pub enum PhoneVerificationEvent {
    /// The provider obtained a credential without user input
    AutoVerified(PhoneAuthCredential),
    /// The provider rejected the request
    Failed(AuthError),
    /// The code was dispatched
    CodeSent {
        verification_id: VerificationId,
        resend_token: Option<ResendToken>,
    },
    /// Automatic SMS retrieval gave up; future verifications use this id
    AutoRetrievalTimeout { verification_id: VerificationId },
}

/// Receiving end of a verification's outcome stream
pub type VerificationEvents = mpsc::UnboundedReceiver<PhoneVerificationEvent>;

/// Create a connected sender/receiver pair for verification outcomes
pub fn verification_channel() -> (
    mpsc::UnboundedSender<PhoneVerificationEvent>,
    VerificationEvents,
) {
    mpsc::unbounded_channel()
}

pub type CodeSentCallback = Arc<dyn Fn() + Send + Sync>;
pub type LoginSuccessCallback = Arc<dyn Fn(&LoginResult, bool) + Send + Sync>;
pub type LoginFailedCallback = Arc<dyn Fn(&AuthError) + Send + Sync>;

/// The three callback slots of a configured session
#[derive(Clone, Default)]
pub(crate) struct Callbacks {
    pub(crate) on_code_sent: Option<CodeSentCallback>,
    pub(crate) on_login_success: Option<LoginSuccessCallback>,
    pub(crate) on_login_failed: Option<LoginFailedCallback>,
}

impl Callbacks {
    pub(crate) fn is_empty(&self) -> bool {
        self.on_code_sent.is_none()
            && self.on_login_success.is_none()
            && self.on_login_failed.is_none()
    }
}

/// Which kind of pending material the session holds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingKind {
    Token,
    Confirmation,
}

/// Point-in-time view of a session, delivered to observers
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Session identifier used in logs
    pub session_id: Uuid,
    /// Configured phone number
    pub phone_number: Option<String>,
    /// Whether the provider confirmed code dispatch
    pub code_sent: bool,
    /// Pending verification material, if any
    pub pending: Option<PendingKind>,
    /// Verification id of a token-based pending verification
    pub verification_id: Option<VerificationId>,
    /// Whether a resend token is held
    pub has_resend_token: bool,
    /// Length of the verification window
    pub timeout: Duration,
    /// Time left on the countdown
    pub remaining: Duration,
    /// Whether the countdown is ticking
    pub timer_active: bool,
    /// When the code was dispatched
    pub code_sent_at: Option<DateTime<Utc>>,
    /// When the verification window closes
    pub expires_at: Option<DateTime<Utc>>,
    /// Most recent structured failure of this send cycle
    pub last_error: Option<AuthError>,
}
