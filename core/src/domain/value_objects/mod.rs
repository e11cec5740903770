//! Value objects representing immutable domain concepts.

pub mod credential;
pub mod login_result;

// Re-export commonly used types
pub use credential::{PhoneAuthCredential, ResendToken, VerificationId};
pub use login_result::LoginResult;
