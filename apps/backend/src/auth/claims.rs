//! Identity and session claims shared by the auth layer.

use serde::{Deserialize, Serialize};

/// Minimal verified profile carried inside every session token.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    /// Stable subject id from the identity provider
    pub sub: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
}

/// Claims of a backend-issued session token.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SessionClaims {
    #[serde(default)]
    pub sub: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    /// Issued-at (seconds since epoch)
    pub iat: i64,
    /// Expiry (seconds since epoch)
    pub exp: i64,
}

impl SessionClaims {
    pub fn for_user(user: &AuthenticatedUser, iat: i64, exp: i64) -> Self {
        Self {
            sub: Some(user.sub.clone()),
            email: Some(user.email.clone()),
            name: user.name.clone(),
            picture: user.picture.clone(),
            iat,
            exp,
        }
    }

    /// The embedded profile, or `None` when `sub` or `email` is missing/empty.
    pub fn into_user(self) -> Option<AuthenticatedUser> {
        let sub = self.sub.filter(|s| !s.is_empty())?;
        let email = self.email.filter(|e| !e.is_empty())?;
        Some(AuthenticatedUser {
            sub,
            email,
            name: self.name,
            picture: self.picture,
        })
    }
}
