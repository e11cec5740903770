//! Phone auth session module
//!
//! This module drives a phone-number OTP login against an external provider:
//! - Code dispatch through id-correlated or confirmation-object verification
//! - A one-second display countdown bounded by the verification window
//! - Code verification and success/failure dispatch
//! - Change notifications for presentation layers

mod config;
mod countdown;
mod notifier;
mod pending;
mod session;
mod traits;
mod types;

#[cfg(test)]
mod tests;

pub use config::{SessionOptions, MAX_TIMEOUT_SECS};
pub use countdown::{Countdown, CountdownState, IntervalTickSource, TickOutcome};
pub use notifier::{ChangeNotifier, ListenerId};
pub use pending::{Completion, PendingVerification};
pub use session::PhoneAuthSession;
pub use traits::{AuthProvider, ConfirmationHandle, HumanVerifier, TickSource, Ticker};
pub use types::{
    verification_channel, CodeSentCallback, LoginFailedCallback, LoginSuccessCallback,
    PendingKind, PhoneVerificationEvent, PhoneVerificationRequest, SessionSnapshot,
    VerificationEvents,
};
