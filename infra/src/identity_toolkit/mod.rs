//! Identity Toolkit provider adapter
//!
//! Implements the session's `AuthProvider` contract over the Identity
//! Toolkit REST API:
//! - `accounts:sendVerificationCode` for code dispatch
//! - `accounts:signInWithPhoneNumber` for code verification
//! - Mapping of API reason strings onto `AuthErrorCode`

mod client;
mod config;
mod errors;
mod provider;
mod types;

#[cfg(test)]
mod tests;

pub use client::IdentityToolkitClient;
pub use config::{IdentityToolkitConfig, DEFAULT_BASE_URL};
pub use errors::{error_from_response, map_reason};
pub use provider::{IdentityToolkitConfirmation, IdentityToolkitProvider};
