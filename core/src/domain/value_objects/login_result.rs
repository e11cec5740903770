//! Result of a completed phone login.

use serde::{Deserialize, Serialize};

use crate::domain::entities::AuthUser;

/// What the provider returns once a credential has been accepted
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoginResult {
    /// The signed-in user
    pub user: AuthUser,

    /// Provider ID token, if the provider issues one
    pub id_token: Option<String>,

    /// Provider refresh token, if the provider issues one
    pub refresh_token: Option<String>,

    /// ID token lifetime in seconds
    pub expires_in: Option<i64>,

    /// Whether this login created the account
    pub is_new_user: bool,
}

impl LoginResult {
    /// Creates a login result carrying only the user
    pub fn for_user(user: AuthUser) -> Self {
        Self {
            user,
            id_token: None,
            refresh_token: None,
            expires_in: None,
            is_new_user: false,
        }
    }

    /// Attach provider tokens
    pub fn with_tokens(
        mut self,
        id_token: impl Into<String>,
        refresh_token: impl Into<String>,
        expires_in: i64,
    ) -> Self {
        self.id_token = Some(id_token.into());
        self.refresh_token = Some(refresh_token.into());
        self.expires_in = Some(expires_in);
        self
    }

    /// Mark whether the account was created by this login
    pub fn new_user(mut self, is_new_user: bool) -> Self {
        self.is_new_user = is_new_user;
        self
    }
}
