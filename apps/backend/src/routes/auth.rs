use std::time::SystemTime;

use actix_web::{web, HttpResponse, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::{mint_session_token, AuthenticatedUser};
use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::logging::Redacted;
use crate::routes::reply;
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
pub struct GoogleLoginRequest {
    #[serde(default)]
    pub credential: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AuthenticatedUser,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: AuthenticatedUser,
}

/// Exchange a Google ID token for a session token.
async fn google_login(
    req: web::Json<GoogleLoginRequest>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let credential = req.credential.trim();
    if credential.is_empty() {
        return Err(AppError::invalid_request("credential is required"));
    }

    let user = app_state.identity.verify(credential).await?;
    let token = mint_session_token(&user, SystemTime::now(), &app_state.security)?;

    info!(sub = %user.sub, email = %Redacted(&user.email), "session issued");
    Ok(reply::success(LoginResponse { token, user }))
}

async fn me(user: CurrentUser) -> HttpResponse {
    reply::success(MeResponse { user: user.0 })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/google").route(web::post().to(google_login)))
        .service(web::resource("/me").route(web::get().to(me)));
}
