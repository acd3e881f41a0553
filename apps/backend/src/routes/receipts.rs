use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use bytes::{Bytes, BytesMut};
use futures_util::TryStreamExt;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::{RawRecord, Receipt};
use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::routes::reply;
use crate::services::{DispatchOutcome, DispatchRequest, ExtractRequest, ExtractedReceipt, ImageUpload};
use crate::state::app_state::AppState;

/// Uploads larger than this are rejected before reaching the model.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, Serialize)]
struct ExtractedBody {
    data: ExtractedReceipt,
}

#[derive(Debug, Serialize)]
struct SavedBody {
    receipt_id: String,
}

#[derive(Debug, Serialize)]
struct ListBody {
    data: Vec<Receipt>,
}

#[derive(Debug, Serialize)]
struct SaveUrlBody {
    #[serde(rename = "saveUrl")]
    save_url: String,
}

fn multipart_error(err: actix_multipart::MultipartError) -> AppError {
    AppError::invalid_image(format!("Malformed upload: {err}"))
}

/// First file part of the form, buffered up to `MAX_IMAGE_BYTES`.
async fn read_image(mut payload: Multipart) -> Result<ImageUpload, AppError> {
    while let Some(mut field) = payload.try_next().await.map_err(multipart_error)? {
        let filename = field
            .content_disposition()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let Some(filename) = filename else {
            continue;
        };
        let content_type = field.content_type().map(|m| m.essence_str().to_string());

        let mut buf = BytesMut::new();
        while let Some(chunk) = field.try_next().await.map_err(multipart_error)? {
            if buf.len() + chunk.len() > MAX_IMAGE_BYTES {
                return Err(AppError::invalid_image("Image exceeds the 10 MiB upload limit"));
            }
            buf.extend_from_slice(&chunk);
        }

        return Ok(ImageUpload {
            filename: Some(filename),
            content_type,
            bytes: buf.freeze(),
        });
    }

    Err(AppError::invalid_image("No image file uploaded"))
}

async fn extract_receipt(
    user: &CurrentUser,
    app_state: &AppState,
    payload: Multipart,
) -> Result<ExtractedReceipt, AppError> {
    let image = read_image(payload).await?;
    debug!(sub = %user.sub(), size = image.bytes.len(), "extracting receipt");

    match app_state
        .dispatcher
        .dispatch(DispatchRequest::Extract(ExtractRequest { image }))
        .await?
    {
        DispatchOutcome::Extracted(data) => Ok(data),
        DispatchOutcome::Reply(_) => Err(AppError::internal("Unexpected chat reply to extraction")),
    }
}

async fn extract(user: CurrentUser, app_state: web::Data<AppState>, payload: Multipart) -> HttpResponse {
    match extract_receipt(&user, &app_state, payload).await {
        Ok(data) => reply::success(ExtractedBody { data }),
        Err(err) => reply::failure("extract_receipt", &err),
    }
}

async fn save(user: CurrentUser, app_state: web::Data<AppState>, body: Bytes) -> HttpResponse {
    let raw = match serde_json::from_slice::<RawRecord>(&body) {
        Ok(raw) => raw,
        Err(e) => {
            let err = AppError::invalid_request(format!("Receipt body must be a JSON object: {e}"));
            return reply::failure("save_receipt", &err);
        }
    };

    match app_state.receipts.save(&raw, user.sub()).await {
        Ok(receipt_id) => {
            info!(sub = %user.sub(), %receipt_id, "receipt saved");
            reply::success(SavedBody { receipt_id })
        }
        Err(err) => reply::failure("save_receipt", &err),
    }
}

/// Listing failures are server errors, not in-band replies.
async fn list(user: CurrentUser, app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let data = app_state.receipts.list(user.sub()).await?;
    Ok(reply::success(ListBody { data }))
}

async fn wallet_save_url(
    user: &CurrentUser,
    app_state: &AppState,
    receipt_id: &str,
) -> Result<String, AppError> {
    let wallet = app_state
        .wallet
        .as_ref()
        .ok_or_else(AppError::wallet_unavailable)?;
    let receipt = app_state.receipts.get_for_wallet(receipt_id, user.sub()).await?;
    wallet.build_save_url(&receipt).await
}

async fn save_to_wallet(
    user: CurrentUser,
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    match wallet_save_url(&user, &app_state, &path).await {
        Ok(save_url) => reply::success(SaveUrlBody { save_url }),
        Err(err) => reply::failure("save_to_wallet", &err),
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/extract-receipt").route(web::post().to(extract)))
        .service(web::resource("/save-receipt").route(web::post().to(save)))
        .service(web::resource("/receipts").route(web::get().to(list)))
        .service(web::resource("/save-to-wallet/{receipt_id}").route(web::post().to(save_to_wallet)));
}
