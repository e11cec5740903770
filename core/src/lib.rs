//! # Phone OTP Login Core
//!
//! Session controller for phone-number one-time-password login: it asks an
//! external authentication provider for a code, tracks the pending
//! verification, runs the display countdown, verifies submitted codes and
//! reports the outcome through callbacks and change notifications.

pub mod domain;
pub mod errors;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use services::*;
