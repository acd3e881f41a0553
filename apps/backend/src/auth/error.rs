//! Authentication failures shared by the identity verifier, the session
//! token validator and the bearer extractor.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No usable `Authorization: Bearer <token>` header.
    #[error("Authorization header missing")]
    MissingCredential,
    /// Signature, algorithm or token structure rejected.
    #[error("Invalid token")]
    Invalid,
    /// Token is at or past its `exp` timestamp.
    #[error("Token expired")]
    Expired,
    /// Token verified but `sub` or `email` is missing.
    #[error("Malformed token payload")]
    Malformed,
    /// Google rejected or could not vouch for the identity assertion.
    #[error("Invalid Google credential")]
    UntrustedIdentity(String),
    /// The expected audience (Google client id) is not configured.
    #[error("GOOGLE_CLIENT_ID is not configured")]
    NotConfigured,
}

impl AuthError {
    /// Server-side misconfiguration rather than a caller problem.
    pub fn is_internal(&self) -> bool {
        matches!(self, AuthError::NotConfigured)
    }
}
