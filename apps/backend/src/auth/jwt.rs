use std::time::{SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};

use crate::auth::claims::{AuthenticatedUser, SessionClaims};
use crate::auth::error::AuthError;
use crate::error::AppError;
use crate::state::security_config::SecurityConfig;

fn unix_seconds(at: SystemTime) -> Option<i64> {
    at.duration_since(UNIX_EPOCH)
        .ok()
        .map(|d| d.as_secs() as i64)
}

/// Mint a session token for `user`, valid for `security.session_ttl` from `now`.
pub fn mint_session_token(
    user: &AuthenticatedUser,
    now: SystemTime,
    security: &SecurityConfig,
) -> Result<String, AppError> {
    let iat = unix_seconds(now).ok_or_else(|| AppError::internal("Failed to get current time"))?;
    let exp = iat + security.session_ttl.as_secs() as i64;

    let claims = SessionClaims::for_user(user, iat, exp);

    encode(
        &Header::new(security.algorithm),
        &claims,
        &EncodingKey::from_secret(&security.jwt_secret),
    )
    .map_err(|e| AppError::internal(format!("Failed to encode JWT: {e}")))
}

/// Verify a session token against the current clock.
pub fn verify_session_token(
    token: &str,
    security: &SecurityConfig,
) -> Result<AuthenticatedUser, AuthError> {
    verify_session_token_at(token, security, SystemTime::now())
}

/// Verify a session token as of `now`.
///
/// Errors:
/// - bad signature, wrong algorithm, undecodable payload → `AuthError::Invalid`
/// - `now >= exp` → `AuthError::Expired`
/// - empty or missing `sub`/`email` → `AuthError::Malformed`
pub fn verify_session_token_at(
    token: &str,
    security: &SecurityConfig,
    now: SystemTime,
) -> Result<AuthenticatedUser, AuthError> {
    // Expiry is checked below with no leeway: a token is dead at exactly `exp`.
    let mut validation = Validation::new(security.algorithm);
    validation.validate_exp = false;
    validation.leeway = 0;
    validation.set_required_spec_claims(&["exp"]);

    let claims = decode::<SessionClaims>(
        token,
        &DecodingKey::from_secret(&security.jwt_secret),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|_| AuthError::Invalid)?;

    let now = unix_seconds(now).ok_or(AuthError::Invalid)?;
    if now >= claims.exp {
        return Err(AuthError::Expired);
    }

    claims.into_user().ok_or(AuthError::Malformed)
}
