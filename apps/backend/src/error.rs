use actix_web::error::ResponseError;
use actix_web::http::{header, StatusCode};
use actix_web::HttpResponse;
use serde::Serialize;
use thiserror::Error;

use crate::auth::error::AuthError;
use crate::errors::ErrorCode;
use crate::trace_ctx;

#[derive(Serialize)]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub type_: String,
    pub title: String,
    pub status: u16,
    pub detail: String,
    pub code: String,
    pub trace_id: String,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
    #[error("Invalid request: {detail}")]
    InvalidRequest { code: ErrorCode, detail: String },
    #[error("Not found: {detail}")]
    NotFound { code: ErrorCode, detail: String },
    #[error("Storage error: {detail}")]
    Storage { detail: String },
    #[error("Extraction error: {detail}")]
    Extraction { detail: String },
    #[error("Wallet error: {detail}")]
    Wallet { code: ErrorCode, detail: String },
    #[error("Configuration error: {detail}")]
    Config { detail: String },
    #[error("Internal error: {detail}")]
    Internal { detail: String },
}

impl AppError {
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Auth(auth) => match auth {
                AuthError::MissingCredential => ErrorCode::UnauthorizedMissingBearer,
                AuthError::Invalid => ErrorCode::UnauthorizedInvalidJwt,
                AuthError::Expired => ErrorCode::UnauthorizedExpiredJwt,
                AuthError::Malformed => ErrorCode::UnauthorizedMalformedJwt,
                AuthError::UntrustedIdentity(_) => ErrorCode::InvalidGoogleCredential,
                AuthError::NotConfigured => ErrorCode::GoogleClientIdMissing,
            },
            AppError::InvalidRequest { code, .. } => *code,
            AppError::NotFound { code, .. } => *code,
            AppError::Storage { .. } => ErrorCode::StorageError,
            AppError::Extraction { .. } => ErrorCode::ExtractionError,
            AppError::Wallet { code, .. } => *code,
            AppError::Config { .. } => ErrorCode::ConfigError,
            AppError::Internal { .. } => ErrorCode::Internal,
        }
    }

    /// Human-readable message; also used as the `message` of
    /// `{status: "error"}` bodies.
    pub fn detail(&self) -> String {
        match self {
            AppError::Auth(auth) => auth.to_string(),
            AppError::InvalidRequest { detail, .. } => detail.clone(),
            AppError::NotFound { detail, .. } => detail.clone(),
            AppError::Storage { detail } => detail.clone(),
            AppError::Extraction { detail } => detail.clone(),
            AppError::Wallet { detail, .. } => detail.clone(),
            AppError::Config { detail } => detail.clone(),
            AppError::Internal { detail } => detail.clone(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Auth(auth) if auth.is_internal() => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Auth(_) => StatusCode::UNAUTHORIZED,
            AppError::InvalidRequest { .. } => StatusCode::BAD_REQUEST,
            AppError::NotFound { .. } => StatusCode::NOT_FOUND,
            AppError::Storage { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Extraction { .. } => StatusCode::BAD_GATEWAY,
            AppError::Wallet { .. } => StatusCode::BAD_GATEWAY,
            AppError::Config { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::InvalidRequest {
            code: ErrorCode::InvalidRequest,
            detail: detail.into(),
        }
    }

    pub fn invalid_image(detail: impl Into<String>) -> Self {
        Self::InvalidRequest {
            code: ErrorCode::InvalidImage,
            detail: detail.into(),
        }
    }

    pub fn receipt_not_found() -> Self {
        Self::NotFound {
            code: ErrorCode::ReceiptNotFound,
            detail: "Receipt not found".to_string(),
        }
    }

    pub fn storage(detail: impl Into<String>) -> Self {
        Self::Storage {
            detail: detail.into(),
        }
    }

    pub fn extraction(detail: impl Into<String>) -> Self {
        Self::Extraction {
            detail: detail.into(),
        }
    }

    pub fn wallet(detail: impl Into<String>) -> Self {
        Self::Wallet {
            code: ErrorCode::WalletError,
            detail: detail.into(),
        }
    }

    pub fn wallet_unavailable() -> Self {
        Self::Wallet {
            code: ErrorCode::WalletUnavailable,
            detail: "Wallet issuer is not configured".to_string(),
        }
    }

    pub fn config(detail: impl Into<String>) -> Self {
        Self::Config {
            detail: detail.into(),
        }
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::Internal {
            detail: detail.into(),
        }
    }

    fn humanize_code(code: &str) -> String {
        code.split('_')
            .map(|word| {
                let mut chars = word.chars();
                match chars.next() {
                    None => String::new(),
                    Some(first) => first
                        .to_uppercase()
                        .chain(chars.flat_map(char::to_lowercase))
                        .collect(),
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status();
        let code = self.code();
        let trace_id = trace_ctx::trace_id();

        let problem_details = ProblemDetails {
            type_: format!("https://raseed.app/errors/{}", code.as_str()),
            title: Self::humanize_code(code.as_str()),
            status: status.as_u16(),
            detail: self.detail(),
            code: code.to_string(),
            trace_id: trace_id.clone(),
        };

        let mut builder = HttpResponse::build(status);
        builder
            .content_type("application/problem+json")
            .insert_header(("x-trace-id", trace_id));
        if status == StatusCode::UNAUTHORIZED {
            builder.insert_header((header::WWW_AUTHENTICATE, "Bearer"));
        }
        builder.json(problem_details)
    }
}
