//! Shared utilities and common types for the phone OTP login workspace
//!
//! This crate provides functionality used across the workspace crates:
//! - Configuration types (environment, logging, phone auth settings)
//! - Utility functions (phone normalization, validation and masking)

pub mod config;
pub mod utils;

// Re-export commonly used items at crate root
pub use config::{
    Environment, LogFormat, LoggingConfig, PhoneAuthSettings, Settings, SettingsError,
    VerificationMechanism, DEFAULT_TIMEOUT_SECS,
};
pub use utils::phone;
