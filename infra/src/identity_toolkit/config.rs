//! Identity Toolkit client configuration

use crate::InfrastructureError;

/// Public REST endpoint
pub const DEFAULT_BASE_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Identity Toolkit configuration
#[derive(Clone)]
pub struct IdentityToolkitConfig {
    /// Web API key of the project
    pub api_key: String,
    /// REST endpoint, overridable for emulators
    pub base_url: String,
    /// Token used when no human verifier is attached
    pub recaptcha_token: Option<String>,
    /// Timeout for API requests in seconds
    pub request_timeout_secs: u64,
}

impl IdentityToolkitConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            recaptcha_token: None,
            request_timeout_secs: 30,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, InfrastructureError> {
        dotenvy::dotenv().ok();

        let api_key = std::env::var("IDENTITY_TOOLKIT_API_KEY").map_err(|_| {
            InfrastructureError::Config("IDENTITY_TOOLKIT_API_KEY not set".to_string())
        })?;
        if api_key.trim().is_empty() {
            return Err(InfrastructureError::Config(
                "IDENTITY_TOOLKIT_API_KEY is empty".to_string(),
            ));
        }

        let base_url = std::env::var("IDENTITY_TOOLKIT_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(InfrastructureError::Config(format!(
                "IDENTITY_TOOLKIT_BASE_URL must be an http(s) URL, got '{}'",
                base_url
            )));
        }

        Ok(Self {
            api_key,
            base_url,
            recaptcha_token: std::env::var("IDENTITY_TOOLKIT_RECAPTCHA_TOKEN")
                .ok()
                .filter(|token| !token.is_empty()),
            request_timeout_secs: std::env::var("IDENTITY_TOOLKIT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
        })
    }

    /// Full URL of an `accounts:<method>` endpoint
    pub fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/accounts:{}?key={}",
            self.base_url.trim_end_matches('/'),
            method,
            self.api_key
        )
    }
}

// The API key stays out of logs.
impl std::fmt::Debug for IdentityToolkitConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IdentityToolkitConfig")
            .field("base_url", &self.base_url)
            .field("has_recaptcha_token", &self.recaptcha_token.is_some())
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish_non_exhaustive()
    }
}
