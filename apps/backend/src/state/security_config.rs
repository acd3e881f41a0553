use std::time::Duration;

use jsonwebtoken::Algorithm;

use crate::error::AppError;

/// Default session lifetime: 1440 minutes.
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(1440 * 60);

/// Signing settings for backend-issued session tokens.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Secret used for signing and verifying session tokens
    pub jwt_secret: Vec<u8>,
    /// HMAC algorithm (defaults to HS256)
    pub algorithm: Algorithm,
    /// Lifetime of a freshly issued session token
    pub session_ttl: Duration,
}

impl SecurityConfig {
    pub fn new(jwt_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            algorithm: Algorithm::HS256,
            session_ttl: DEFAULT_SESSION_TTL,
        }
    }

    /// Switch the signing algorithm. Only the HMAC family works with a shared
    /// secret, anything else is a configuration error.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Result<Self, AppError> {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => {
                self.algorithm = algorithm;
                Ok(self)
            }
            other => Err(AppError::config(format!(
                "JWT_ALGORITHM {other:?} is not a symmetric HMAC algorithm"
            ))),
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self::new(b"default_secret_for_tests_only".to_vec())
    }
}
