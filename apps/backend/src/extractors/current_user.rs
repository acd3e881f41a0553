use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::{web, FromRequest, HttpRequest};
use tracing::debug;

use super::auth_token::AuthToken;
use crate::auth::{verify_session_token, AuthenticatedUser};
use crate::error::AppError;
use crate::state::app_state::AppState;

/// The caller, as recorded in a valid session token.
///
/// Extracting this runs before the handler body, so an unauthenticated
/// request never reaches business logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub AuthenticatedUser);

impl CurrentUser {
    pub fn sub(&self) -> &str {
        &self.0.sub
    }
}

fn resolve(req: &HttpRequest) -> Result<CurrentUser, AppError> {
    let state = req
        .app_data::<web::Data<AppState>>()
        .ok_or_else(|| AppError::internal("AppState not available"))?;

    let AuthToken { token } = AuthToken::from_headers(req)?;

    let user = verify_session_token(&token, &state.security).inspect_err(|e| {
        debug!(reason = %e, "session token rejected");
    })?;

    Ok(CurrentUser(user))
}

impl FromRequest for CurrentUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(resolve(req))
    }
}
