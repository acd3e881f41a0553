use std::future::{ready, Ready};

use actix_web::{dev::Payload, http::header, FromRequest, HttpRequest};

use crate::auth::AuthError;
use crate::AppError;

/// Bearer credential taken from the Authorization header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthToken {
    pub token: String,
}

/// Parse `Bearer <token>`. The scheme is matched case-insensitively.
pub fn parse_bearer(value: &str) -> Option<&str> {
    let mut parts = value.split_whitespace();
    let scheme = parts.next()?;
    let token = parts.next()?;
    if parts.next().is_some() || !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return None;
    }
    Some(token)
}

impl AuthToken {
    pub fn from_headers(req: &HttpRequest) -> Result<Self, AppError> {
        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_bearer)
            .map(|token| AuthToken {
                token: token.to_string(),
            })
            .ok_or_else(|| AuthError::MissingCredential.into())
    }
}

impl FromRequest for AuthToken {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req))
    }
}
