//! Save-to-wallet flow: register the pass object, then hand back a signed
//! save URL for the client to open.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::domain::Receipt;
use crate::error::AppError;
use crate::google::ServiceAccount;
use crate::wallet::{build_generic_object, GenericObject, WalletIssuer, WalletSettings};

pub const SAVE_URL_PREFIX: &str = "https://pay.google.com/gp/v/save/";

#[derive(Debug, Serialize)]
pub struct SaveClaims<'a> {
    pub iss: &'a str,
    pub aud: &'static str,
    pub typ: &'static str,
    pub payload: SavePayload<'a>,
}

#[derive(Debug, Serialize)]
pub struct SavePayload<'a> {
    #[serde(rename = "genericObjects")]
    pub generic_objects: [&'a GenericObject; 1],
}

pub struct WalletService {
    issuer: Arc<dyn WalletIssuer>,
    signer: ServiceAccount,
    settings: WalletSettings,
}

impl WalletService {
    pub fn new(issuer: Arc<dyn WalletIssuer>, signer: ServiceAccount, settings: WalletSettings) -> Self {
        Self {
            issuer,
            signer,
            settings,
        }
    }

    pub fn settings(&self) -> &WalletSettings {
        &self.settings
    }

    /// Register `receipt` with the issuer and return its save URL.
    ///
    /// Nothing is persisted locally; calling this twice for one receipt
    /// re-submits the same object id, which the issuer reports as existing.
    pub async fn build_save_url(&self, receipt: &Receipt) -> Result<String, AppError> {
        let receipt_id = receipt
            .id
            .as_deref()
            .ok_or_else(|| AppError::invalid_request("Receipt has no id"))?;

        let object = build_generic_object(receipt, receipt_id, &self.settings);
        let outcome = self.issuer.insert_object(&object).await?;

        let token = self
            .signer
            .sign(&SaveClaims {
                iss: self.signer.client_email(),
                aud: "google",
                typ: "savetowallet",
                payload: SavePayload {
                    generic_objects: [&object],
                },
            })
            .map_err(|e| AppError::wallet(e.to_string()))?;

        info!(receipt_id, object_id = %object.id, ?outcome, "wallet save URL issued");
        Ok(format!("{SAVE_URL_PREFIX}{token}"))
    }
}
