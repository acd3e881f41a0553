use std::time::{Duration, SystemTime};

use crate::auth::{mint_session_token, AuthenticatedUser};
use crate::state::security_config::SecurityConfig;

pub const TEST_JWT_SECRET: &[u8] = b"test_secret_key_for_testing_purposes_only";

pub fn test_security() -> SecurityConfig {
    SecurityConfig::new(TEST_JWT_SECRET)
}

pub fn test_user(sub: &str) -> AuthenticatedUser {
    AuthenticatedUser {
        sub: sub.to_string(),
        email: format!("{sub}@example.test"),
        name: Some(format!("User {sub}")),
        picture: None,
    }
}

/// `Authorization` header value for `user`, minted `age` ago.
///
/// Panics if minting fails; only for tests.
pub fn bearer(user: &AuthenticatedUser, security: &SecurityConfig, age: Duration) -> String {
    let issued = SystemTime::now() - age;
    match mint_session_token(user, issued, security) {
        Ok(token) => format!("Bearer {token}"),
        Err(e) => panic!("failed to mint test token: {e}"),
    }
}
