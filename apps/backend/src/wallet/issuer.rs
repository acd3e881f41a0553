use async_trait::async_trait;
use reqwest::StatusCode;
use thiserror::Error;
use tracing::{info, warn};

use super::object::GenericObject;
use crate::error::AppError;
use crate::google::{ServiceAccount, ServiceAccountError};

pub const WALLET_SCOPE: &str = "https://www.googleapis.com/auth/wallet_object.issuer";
pub const WALLET_API: &str = "https://walletobjects.googleapis.com/walletobjects/v1";

#[derive(Debug, Error)]
pub enum WalletIssuerError {
    #[error(transparent)]
    Credentials(#[from] ServiceAccountError),
    #[error("wallet request failed: {0}")]
    Transport(String),
    /// Raw provider body for any status other than 200/409.
    #[error("{body}")]
    Rejected { status: u16, body: String },
}

impl From<WalletIssuerError> for AppError {
    fn from(err: WalletIssuerError) -> Self {
        AppError::wallet(err.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Created,
    AlreadyExists,
}

/// Registers pass objects with the wallet provider.
#[async_trait]
pub trait WalletIssuer: Send + Sync {
    async fn insert_object(&self, object: &GenericObject) -> Result<InsertOutcome, WalletIssuerError>;
}

pub struct GoogleWalletIssuer {
    http: reqwest::Client,
    account: ServiceAccount,
    base_url: String,
}

impl GoogleWalletIssuer {
    pub fn new(http: reqwest::Client, account: ServiceAccount) -> Self {
        Self {
            http,
            account,
            base_url: WALLET_API.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[async_trait]
impl WalletIssuer for GoogleWalletIssuer {
    async fn insert_object(&self, object: &GenericObject) -> Result<InsertOutcome, WalletIssuerError> {
        let token = self.account.access_token(&self.http, WALLET_SCOPE).await?;

        let response = self
            .http
            .post(format!("{}/genericObject", self.base_url))
            .bearer_auth(token)
            .json(object)
            .send()
            .await
            .map_err(|e| WalletIssuerError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::OK => {
                info!(object_id = %object.id, "wallet object created");
                Ok(InsertOutcome::Created)
            }
            StatusCode::CONFLICT => {
                info!(object_id = %object.id, "wallet object already exists");
                Ok(InsertOutcome::AlreadyExists)
            }
            status => {
                let body = response.text().await.unwrap_or_default();
                warn!(object_id = %object.id, status = status.as_u16(), "wallet object rejected");
                Err(WalletIssuerError::Rejected {
                    status: status.as_u16(),
                    body,
                })
            }
        }
    }
}
