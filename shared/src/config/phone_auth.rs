//! Phone auth session configuration

use std::path::Path;
use std::time::Duration;

use config::{Config, Environment as EnvSource, File};
use serde::{Deserialize, Serialize};

use super::SettingsError;

/// Default countdown length for a verification window, in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// How the provider delivers and confirms codes on this platform.
///
/// The mechanism is a property of the deployment target, so it is chosen
/// once per process rather than per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum VerificationMechanism {
    /// Provider returns a verification id that is paired with the code
    #[default]
    Token,
    /// Provider returns a confirmation object that accepts the code
    Confirmation,
}

impl std::fmt::Display for VerificationMechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationMechanism::Token => write!(f, "token"),
            VerificationMechanism::Confirmation => write!(f, "confirmation"),
        }
    }
}

/// Process-wide phone auth settings
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PhoneAuthSettings {
    /// Code delivery/confirmation mechanism
    #[serde(default)]
    pub mechanism: VerificationMechanism,

    /// Default verification window in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Default sign-out policy applied to new sessions
    #[serde(default)]
    pub sign_out_on_success: bool,
}

impl Default for PhoneAuthSettings {
    fn default() -> Self {
        Self {
            mechanism: VerificationMechanism::default(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            sign_out_on_success: false,
        }
    }
}

impl PhoneAuthSettings {
    /// Load from `PHONE_AUTH_*` environment variables only
    pub fn from_env() -> Result<Self, SettingsError> {
        dotenvy::dotenv().ok();
        Self::load_from(None)
    }

    /// Load from an optional TOML file (its `[phone_auth]` table) overlaid
    /// with `PHONE_AUTH_*` environment variables
    pub fn load_from(path: Option<&Path>) -> Result<Self, SettingsError> {
        let mut builder = Config::builder()
            .set_default("mechanism", "token")?
            .set_default("timeout_secs", DEFAULT_TIMEOUT_SECS as i64)?
            .set_default("sign_out_on_success", false)?;

        if let Some(path) = path {
            let file = Config::builder()
                .add_source(File::from(path).required(false))
                .build()?;
            if let Ok(section) = file.get_table("phone_auth") {
                for (key, value) in section {
                    builder = builder.set_override(key, value)?;
                }
            }
        }

        let settings: Self = builder
            .add_source(EnvSource::with_prefix("PHONE_AUTH").try_parsing(true))
            .build()?
            .try_deserialize()?;

        settings.validate()?;
        Ok(settings)
    }

    /// Reject values no session could run with
    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.timeout_secs > 3600 {
            return Err(SettingsError::Invalid {
                field: "timeout_secs".to_string(),
                message: format!("{} exceeds the one hour maximum", self.timeout_secs),
            });
        }
        Ok(())
    }

    /// Default verification window as a `Duration`
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
