use actix_web::{web, HttpResponse};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::error::AppError;
use crate::extractors::CurrentUser;
use crate::logging::pii::redact;
use crate::services::{ChatRequest, DispatchOutcome, DispatchRequest};
use crate::state::app_state::AppState;

#[derive(Debug, Deserialize)]
struct ChatBody {
    #[serde(default)]
    prompt: String,
}

#[derive(Debug, Serialize)]
struct ChatReply {
    reply: String,
}

async fn answer(user: &CurrentUser, app_state: &AppState, body: &[u8]) -> Result<String, AppError> {
    let ChatBody { prompt } = serde_json::from_slice(body)
        .map_err(|e| AppError::invalid_request(format!("Expected a JSON body with a prompt: {e}")))?;
    if prompt.trim().is_empty() {
        return Err(AppError::invalid_request("Prompt must not be empty"));
    }

    let receipts = app_state.receipts.list(user.sub()).await?;
    match app_state
        .dispatcher
        .dispatch(DispatchRequest::Chat(ChatRequest { prompt, receipts }))
        .await?
    {
        DispatchOutcome::Reply(reply) => Ok(reply),
        DispatchOutcome::Extracted(_) => Err(AppError::internal("Unexpected extraction for chat prompt")),
    }
}

/// Answer a question about the caller's own receipts.
///
/// Failures are folded into the reply text as `Error: <message>`.
async fn chat(user: CurrentUser, app_state: web::Data<AppState>, body: Bytes) -> HttpResponse {
    let reply = match answer(&user, &app_state, &body).await {
        Ok(reply) => reply,
        Err(err) => {
            let detail = err.detail();
            if err.status().is_server_error() {
                error!(code = %err.code(), detail = %redact(&detail), "chat failed");
            } else {
                warn!(code = %err.code(), detail = %redact(&detail), "chat rejected");
            }
            format!("Error: {detail}")
        }
    };

    HttpResponse::Ok().json(ChatReply { reply })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/llm-receipt").route(web::post().to(chat)));
}
