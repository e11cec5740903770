//! Business services containing domain logic and use cases.

pub mod phone_auth;

// Re-export commonly used types
pub use phone_auth::{
    AuthProvider, ChangeNotifier, ConfirmationHandle, Countdown, CountdownState,
    HumanVerifier, IntervalTickSource, ListenerId, PendingKind, PendingVerification,
    PhoneAuthSession, PhoneVerificationEvent, PhoneVerificationRequest, SessionOptions,
    SessionSnapshot, TickSource, Ticker, VerificationEvents,
};
