//! Configuration module
//!
//! - `environment` - Environment detection and logging configuration
//! - `phone_auth` - Verification mechanism, countdown and sign-out policy

pub mod environment;
pub mod phone_auth;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use environment::{Environment, LogFormat, LoggingConfig};
pub use phone_auth::{PhoneAuthSettings, VerificationMechanism, DEFAULT_TIMEOUT_SECS};

/// Errors raised while loading configuration
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Invalid configuration value for {field}: {message}")]
    Invalid { field: String, message: String },
}

/// Complete configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Environment configuration
    #[serde(default)]
    pub environment: Environment,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Phone auth session configuration
    #[serde(default)]
    pub phone_auth: PhoneAuthSettings,
}

impl Default for Settings {
    fn default() -> Self {
        let env = Environment::default();
        Self {
            environment: env,
            logging: LoggingConfig::for_environment(env),
            phone_auth: PhoneAuthSettings::default(),
        }
    }
}

impl Settings {
    /// Load settings for the detected environment
    ///
    /// Reads `.env` (if present), then the environment's config file (if
    /// present), then `PHONE_AUTH_*` variables for the phone auth section and
    /// `LOG_LEVEL`/`LOG_FORMAT` for logging.
    pub fn load() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();

        let environment = Environment::from_env();
        let settings = Self {
            environment,
            logging: LoggingConfig::for_environment(environment).with_env_overrides(),
            phone_auth: PhoneAuthSettings::load_from(Some(Path::new(environment.config_file())))?,
        };

        settings.validate()?;
        Ok(settings)
    }

    /// Validate cross-field constraints
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.phone_auth.validate()
    }
}
