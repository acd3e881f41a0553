//! Google Sign-In credential verification.

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use jsonwebtoken::{decode, decode_header, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::auth::claims::AuthenticatedUser;
use crate::auth::error::AuthError;

pub const GOOGLE_CERTS_URL: &str = "https://www.googleapis.com/oauth2/v3/certs";
pub const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

/// Validates a third-party identity assertion and returns the verified profile.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<AuthenticatedUser, AuthError>;
}

#[derive(Debug, Deserialize)]
struct GoogleIdClaims {
    sub: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    picture: Option<String>,
}

/// Verify a Google ID token against an already-fetched key set.
///
/// Signature (RS256), issuer, audience and expiry are all enforced. A token
/// without an `email` claim is rejected, since session tokens require one.
/// Absent `name` and `picture` come back empty rather than invented.
pub fn verify_with_jwks(
    credential: &str,
    jwks: &JwkSet,
    client_id: &str,
) -> Result<AuthenticatedUser, AuthError> {
    let header = decode_header(credential)
        .map_err(|e| AuthError::UntrustedIdentity(format!("invalid token header: {e}")))?;
    let kid = header
        .kid
        .ok_or_else(|| AuthError::UntrustedIdentity("token header missing 'kid'".to_string()))?;
    let jwk = jwks
        .find(&kid)
        .ok_or_else(|| AuthError::UntrustedIdentity(format!("no signing key for kid {kid}")))?;
    let key = DecodingKey::from_jwk(jwk)
        .map_err(|e| AuthError::UntrustedIdentity(format!("unusable signing key: {e}")))?;

    let mut validation = Validation::new(Algorithm::RS256);
    validation.set_issuer(&GOOGLE_ISSUERS);
    validation.set_audience(&[client_id]);

    let claims = decode::<GoogleIdClaims>(credential, &key, &validation)
        .map_err(|e| AuthError::UntrustedIdentity(e.to_string()))?
        .claims;

    let email = claims
        .email
        .filter(|email| !email.trim().is_empty())
        .ok_or_else(|| AuthError::UntrustedIdentity("missing email claim".to_string()))?;

    Ok(AuthenticatedUser {
        sub: claims.sub,
        email,
        name: claims.name,
        picture: claims.picture,
    })
}

/// Verifies Google ID tokens, fetching Google's public keys on every call.
pub struct GoogleIdentityVerifier {
    client_id: Option<String>,
    certs_url: String,
    http: reqwest::Client,
}

impl GoogleIdentityVerifier {
    pub fn new(client_id: Option<String>, http: reqwest::Client) -> Self {
        Self {
            client_id: client_id.filter(|id| !id.trim().is_empty()),
            certs_url: GOOGLE_CERTS_URL.to_string(),
            http,
        }
    }

    pub fn with_certs_url(mut self, url: impl Into<String>) -> Self {
        self.certs_url = url.into();
        self
    }

    async fn fetch_jwks(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .http
            .get(&self.certs_url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| AuthError::UntrustedIdentity(format!("failed to fetch certs: {e}")))?;

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::UntrustedIdentity(format!("unreadable certs: {e}")))
    }
}

#[async_trait]
impl IdentityVerifier for GoogleIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<AuthenticatedUser, AuthError> {
        let client_id = self.client_id.as_deref().ok_or(AuthError::NotConfigured)?;

        let jwks = self.fetch_jwks().await?;
        debug!(keys = jwks.keys.len(), "fetched Google signing keys");

        verify_with_jwks(credential, &jwks, client_id).inspect_err(|e| {
            if let AuthError::UntrustedIdentity(reason) = e {
                warn!(reason = %reason, "Google credential rejected");
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::{SystemTime, UNIX_EPOCH};

    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    use super::*;

    const PRIVATE_KEY: &str = include_str!("../../tests/fixtures/test_rsa_private.pem");
    const JWKS: &str = include_str!("../../tests/fixtures/test_jwks.json");
    const CLIENT_ID: &str = "client-123.apps.googleusercontent.com";

    fn now() -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs() as i64
    }

    fn sign(claims: serde_json::Value, kid: &str) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(kid.to_string());
        encode(
            &header,
            &claims,
            &EncodingKey::from_rsa_pem(PRIVATE_KEY.as_bytes()).unwrap(),
        )
        .unwrap()
    }

    fn jwks() -> JwkSet {
        serde_json::from_str(JWKS).unwrap()
    }

    #[test]
    fn accepts_well_formed_google_token() {
        let token = sign(
            json!({
                "iss": "https://accounts.google.com",
                "aud": CLIENT_ID,
                "sub": "1234567890",
                "email": "alice@example.com",
                "name": "Alice",
                "picture": "https://example.com/a.png",
                "iat": now(),
                "exp": now() + 3600,
            }),
            "test-key-1",
        );

        let user = verify_with_jwks(&token, &jwks(), CLIENT_ID).unwrap();
        assert_eq!(user.sub, "1234567890");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.name.as_deref(), Some("Alice"));
        assert_eq!(user.picture.as_deref(), Some("https://example.com/a.png"));
    }

    #[test]
    fn absent_profile_fields_stay_empty() {
        let token = sign(
            json!({
                "iss": "accounts.google.com",
                "aud": CLIENT_ID,
                "sub": "42",
                "email": "a@example.com",
                "iat": now(),
                "exp": now() + 3600,
            }),
            "test-key-1",
        );

        let user = verify_with_jwks(&token, &jwks(), CLIENT_ID).unwrap();
        assert_eq!(user.email, "a@example.com");
        assert_eq!(user.name, None);
        assert_eq!(user.picture, None);
    }

    #[test]
    fn rejects_token_without_email() {
        let missing = sign(
            json!({
                "iss": "accounts.google.com",
                "aud": CLIENT_ID,
                "sub": "42",
                "iat": now(),
                "exp": now() + 3600,
            }),
            "test-key-1",
        );
        let blank = sign(
            json!({
                "iss": "accounts.google.com",
                "aud": CLIENT_ID,
                "sub": "42",
                "email": "",
                "iat": now(),
                "exp": now() + 3600,
            }),
            "test-key-1",
        );

        for token in [missing, blank] {
            let err = verify_with_jwks(&token, &jwks(), CLIENT_ID).unwrap_err();
            assert!(matches!(err, AuthError::UntrustedIdentity(ref r) if r == "missing email claim"));
        }
    }

    #[test]
    fn rejects_wrong_audience() {
        let token = sign(
            json!({
                "iss": "accounts.google.com",
                "aud": "someone-else",
                "sub": "42",
                "exp": now() + 3600,
            }),
            "test-key-1",
        );

        assert!(matches!(
            verify_with_jwks(&token, &jwks(), CLIENT_ID),
            Err(AuthError::UntrustedIdentity(_))
        ));
    }

    #[test]
    fn rejects_untrusted_issuer() {
        let token = sign(
            json!({
                "iss": "https://evil.example.com",
                "aud": CLIENT_ID,
                "sub": "42",
                "exp": now() + 3600,
            }),
            "test-key-1",
        );

        assert!(matches!(
            verify_with_jwks(&token, &jwks(), CLIENT_ID),
            Err(AuthError::UntrustedIdentity(_))
        ));
    }

    #[test]
    fn rejects_expired_and_unknown_kid() {
        let expired = sign(
            json!({
                "iss": "accounts.google.com",
                "aud": CLIENT_ID,
                "sub": "42",
                "exp": now() - 7200,
            }),
            "test-key-1",
        );
        let unknown_kid = sign(
            json!({
                "iss": "accounts.google.com",
                "aud": CLIENT_ID,
                "sub": "42",
                "exp": now() + 3600,
            }),
            "rotated-away",
        );

        assert!(verify_with_jwks(&expired, &jwks(), CLIENT_ID).is_err());
        assert!(verify_with_jwks(&unknown_kid, &jwks(), CLIENT_ID).is_err());
        assert!(verify_with_jwks("garbage", &jwks(), CLIENT_ID).is_err());
    }

    #[tokio::test]
    async fn missing_client_id_is_not_configured() {
        let verifier = GoogleIdentityVerifier::new(Some("  ".to_string()), reqwest::Client::new());
        assert_eq!(
            verifier.verify("anything").await,
            Err(AuthError::NotConfigured)
        );
    }
}
