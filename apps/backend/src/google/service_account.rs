use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use moka::future::Cache;
use moka::Expiry;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const JWT_BEARER_GRANT: &str = "urn:ietf:params:oauth:grant-type:jwt-bearer";
const ASSERTION_TTL_SECS: u64 = 3600;
/// Cached tokens are dropped this long before Google says they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(60);
const DEFAULT_EXPIRES_IN_SECS: u64 = 3600;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

#[derive(Debug, Clone, Error)]
pub enum ServiceAccountError {
    #[error("cannot load service account key from {path}: {detail}")]
    Load { path: String, detail: String },
    #[error("invalid service account key: {0}")]
    Key(String),
    #[error("failed to sign claims: {0}")]
    Sign(String),
    #[error("token exchange failed: {0}")]
    Token(String),
}

/// Fields of a Google service-account JSON key file that we use.
#[derive(Deserialize, Clone)]
struct ServiceAccountKey {
    client_email: String,
    private_key: String,
    #[serde(default)]
    private_key_id: Option<String>,
    #[serde(default)]
    project_id: Option<String>,
    #[serde(default = "default_token_uri")]
    token_uri: String,
}

#[derive(Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: u64,
    exp: u64,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Clone)]
struct CachedToken {
    access_token: String,
    ttl: Duration,
}

struct TokenExpiry;

impl Expiry<String, CachedToken> for TokenExpiry {
    fn expire_after_create(
        &self,
        _scope: &String,
        token: &CachedToken,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(token.ttl)
    }
}

fn token_cache() -> Cache<String, CachedToken> {
    Cache::builder()
        .max_capacity(16)
        .expire_after(TokenExpiry)
        .build()
}

/// A loaded service account: identity, a parsed RS256 signing key and the
/// access tokens minted so far, keyed by scope.
///
/// Clones share the token cache.
#[derive(Clone)]
pub struct ServiceAccount {
    client_email: String,
    key_id: Option<String>,
    project_id: Option<String>,
    token_uri: String,
    signing_key: EncodingKey,
    tokens: Cache<String, CachedToken>,
}

impl fmt::Debug for ServiceAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceAccount")
            .field("client_email", &self.client_email)
            .field("project_id", &self.project_id)
            .finish_non_exhaustive()
    }
}

impl ServiceAccount {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ServiceAccountError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| ServiceAccountError::Load {
            path: path.display().to_string(),
            detail: e.to_string(),
        })?;
        Self::from_json(&raw)
    }

    pub fn from_json(raw: &str) -> Result<Self, ServiceAccountError> {
        let key: ServiceAccountKey =
            serde_json::from_str(raw).map_err(|e| ServiceAccountError::Key(e.to_string()))?;
        let signing_key = EncodingKey::from_rsa_pem(key.private_key.as_bytes())
            .map_err(|e| ServiceAccountError::Key(e.to_string()))?;

        Ok(Self {
            client_email: key.client_email,
            key_id: key.private_key_id,
            project_id: key.project_id,
            token_uri: key.token_uri,
            signing_key,
            tokens: token_cache(),
        })
    }

    pub fn client_email(&self) -> &str {
        &self.client_email
    }

    pub fn project_id(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    /// Sign `claims` as an RS256 JWT with the account's private key.
    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, ServiceAccountError> {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = self.key_id.clone();
        encode(&header, claims, &self.signing_key)
            .map_err(|e| ServiceAccountError::Sign(e.to_string()))
    }

    /// OAuth2 access token for `scope`.
    ///
    /// Tokens are reused until shortly before their `expires_in`; concurrent
    /// callers for the same scope share a single exchange.
    pub async fn access_token(
        &self,
        http: &reqwest::Client,
        scope: &str,
    ) -> Result<String, ServiceAccountError> {
        self.tokens
            .try_get_with(scope.to_string(), self.exchange(http, scope))
            .await
            .map(|cached| cached.access_token)
            .map_err(Arc::unwrap_or_clone)
    }

    /// Sign an assertion and trade it for a fresh token at `token_uri`.
    async fn exchange(
        &self,
        http: &reqwest::Client,
        scope: &str,
    ) -> Result<CachedToken, ServiceAccountError> {
        let iat = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|e| ServiceAccountError::Sign(e.to_string()))?
            .as_secs();
        let assertion = self.sign(&AssertionClaims {
            iss: &self.client_email,
            scope,
            aud: &self.token_uri,
            iat,
            exp: iat + ASSERTION_TTL_SECS,
        })?;

        let response = http
            .post(&self.token_uri)
            .form(&[("grant_type", JWT_BEARER_GRANT), ("assertion", assertion.as_str())])
            .send()
            .await
            .map_err(|e| ServiceAccountError::Token(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ServiceAccountError::Token(format!("{status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ServiceAccountError::Token(e.to_string()))?;
        let lifetime = Duration::from_secs(token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS));
        debug!(
            client_email = %self.client_email,
            scope,
            expires_in = lifetime.as_secs(),
            "minted service account access token"
        );
        Ok(CachedToken {
            access_token: token.access_token,
            ttl: lifetime.saturating_sub(TOKEN_REFRESH_MARGIN),
        })
    }
}
