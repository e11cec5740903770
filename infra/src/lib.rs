//! # Infrastructure Layer
//!
//! Concrete implementations behind the phone auth session's provider
//! contract, plus process setup shared by binaries and tests.
//!
//! - **Identity Toolkit**: `AuthProvider` over the Identity Toolkit REST API
//! - **Logging**: `tracing-subscriber` installation from `LoggingConfig`

pub mod identity_toolkit;
pub mod logging;

pub use identity_toolkit::{IdentityToolkitConfig, IdentityToolkitProvider};
pub use logging::init_logging;

use otp_shared::{Settings, SettingsError};

/// Load settings and install logging for the detected environment
pub fn initialize() -> Result<Settings, InfrastructureError> {
    let settings = Settings::load()?;
    init_logging(&settings.logging)?;

    tracing::info!(
        environment = %settings.environment,
        mechanism = %settings.phone_auth.mechanism,
        timeout_secs = settings.phone_auth.timeout_secs,
        event = "infrastructure_initialized",
        "Infrastructure initialized"
    );

    Ok(settings)
}

/// Infrastructure-specific error types
#[derive(Debug, thiserror::Error)]
pub enum InfrastructureError {
    /// HTTP client construction error
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// Settings could not be loaded
    #[error(transparent)]
    Settings(#[from] SettingsError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// General infrastructure error
    #[error("Infrastructure error: {0}")]
    General(String),
}
