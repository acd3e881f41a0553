use actix_web::{web, HttpResponse};
use serde::Serialize;
use time::OffsetDateTime;

use crate::state::app_state::AppState;

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    app_version: &'static str,
    store: &'static str,
    wallet: &'static str,
    time: String,
}

/// Liveness plus the wiring chosen at startup. Does not call out to Google.
async fn health(app_state: web::Data<AppState>) -> HttpResponse {
    let time = OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "unknown".to_string());

    HttpResponse::Ok().json(HealthResponse {
        status: "ok",
        app_version: env!("CARGO_PKG_VERSION"),
        store: app_state.store_backend(),
        wallet: if app_state.wallet_enabled() {
            "enabled"
        } else {
            "disabled"
        },
        time,
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("").route(web::get().to(health)));
}
