//! Response bodies shared by the receipt endpoints.
//!
//! Business failures on these endpoints are reported in-band as
//! `{"status": "error", "message": ...}` with HTTP 200; only authentication
//! failures and a failed receipt listing use Problem Details.

use actix_web::HttpResponse;
use serde::Serialize;
use tracing::{error, warn};

use crate::error::AppError;
use crate::logging::pii::redact;

#[derive(Serialize)]
struct Envelope<T> {
    status: &'static str,
    #[serde(flatten)]
    body: T,
}

#[derive(Serialize)]
struct ErrorMessage {
    message: String,
}

/// `{"status": "success", ...body}`
pub fn success<T: Serialize>(body: T) -> HttpResponse {
    HttpResponse::Ok().json(Envelope {
        status: "success",
        body,
    })
}

/// `{"status": "error", "message": ...}` with HTTP 200.
pub fn failure(operation: &'static str, err: &AppError) -> HttpResponse {
    let detail = err.detail();
    if err.status().is_server_error() {
        error!(operation, code = %err.code(), detail = %redact(&detail), "request failed");
    } else {
        warn!(operation, code = %err.code(), detail = %redact(&detail), "request rejected");
    }

    HttpResponse::Ok().json(Envelope {
        status: "error",
        body: ErrorMessage { message: detail },
    })
}
