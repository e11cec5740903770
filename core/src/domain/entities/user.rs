//! The provider-side user a successful phone login resolves to.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// User account as reported by the authentication provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Provider-assigned user id
    pub uid: String,

    /// Verified phone number in E.164 format
    pub phone_number: String,

    /// When the provider created the account, if reported
    pub created_at: Option<DateTime<Utc>>,

    /// When this login happened
    pub last_login_at: DateTime<Utc>,
}

impl AuthUser {
    /// Creates a user that has just signed in
    pub fn new(uid: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            phone_number: phone_number.into(),
            created_at: None,
            last_login_at: Utc::now(),
        }
    }

    /// Attach the provider's account creation time
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }
}
