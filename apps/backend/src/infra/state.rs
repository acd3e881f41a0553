use std::sync::Arc;

use tracing::{info, warn};

use crate::ai::{GeminiClient, ModelClient};
use crate::auth::{GoogleIdentityVerifier, IdentityVerifier};
use crate::config::{AppConfig, StoreConfig};
use crate::error::AppError;
use crate::google::ServiceAccount;
use crate::repos::ReceiptRepo;
use crate::services::dispatcher::DEFAULT_CHAT_CONTEXT_MAX_RECEIPTS;
use crate::services::{Dispatcher, WalletService};
use crate::state::app_state::AppState;
use crate::state::security_config::SecurityConfig;
use crate::store::{DocumentStore, FirestoreStore, InMemoryStore};
use crate::wallet::GoogleWalletIssuer;

/// Builder for creating AppState instances (used in both tests and main).
///
/// Collaborators left unset fall back to inert defaults: an identity verifier
/// without a client id, an in-memory store, a model client without an API
/// key and no wallet.
pub struct StateBuilder {
    security_config: SecurityConfig,
    identity: Option<Arc<dyn IdentityVerifier>>,
    store: Option<Arc<dyn DocumentStore>>,
    model: Option<Arc<dyn ModelClient>>,
    wallet: Option<Arc<WalletService>>,
    models: Option<(String, String)>,
    chat_context_limit: usize,
}

impl StateBuilder {
    pub fn new() -> Self {
        Self {
            security_config: SecurityConfig::default(),
            identity: None,
            store: None,
            model: None,
            wallet: None,
            models: None,
            chat_context_limit: DEFAULT_CHAT_CONTEXT_MAX_RECEIPTS,
        }
    }

    /// Production wiring: real Google clients as described by `config`.
    pub fn from_config(config: &AppConfig, http: reqwest::Client) -> Result<Self, AppError> {
        if config.google_client_id.is_none() {
            warn!("GOOGLE_CLIENT_ID is not set; Google sign-in will fail");
        }
        if config.google_api_key.is_none() {
            warn!("GOOGLE_API_KEY is not set; extraction and chat will fail");
        }

        let store: Arc<dyn DocumentStore> = match &config.store {
            StoreConfig::Memory => Arc::new(InMemoryStore::new()),
            StoreConfig::Firestore {
                credentials,
                project_id,
            } => {
                let account = ServiceAccount::from_file(credentials)
                    .map_err(|e| AppError::config(e.to_string()))?;
                let project_id = project_id
                    .clone()
                    .or_else(|| account.project_id().map(str::to_string))
                    .ok_or_else(|| {
                        AppError::config(
                            "FIRESTORE_PROJECT_ID is not set and the key file has no project_id",
                        )
                    })?;
                Arc::new(FirestoreStore::new(http.clone(), account, &project_id))
            }
        };

        let wallet = match &config.wallet {
            Some(wallet) => {
                let account = ServiceAccount::from_file(&wallet.credentials)
                    .map_err(|e| AppError::config(e.to_string()))?;
                let issuer = GoogleWalletIssuer::new(http.clone(), account.clone());
                Some(Arc::new(WalletService::new(
                    Arc::new(issuer),
                    account,
                    wallet.settings.clone(),
                )))
            }
            None => None,
        };

        Ok(Self::new()
            .with_security(config.security.clone())
            .with_identity(Arc::new(GoogleIdentityVerifier::new(
                config.google_client_id.clone(),
                http.clone(),
            )))
            .with_store(store)
            .with_model(Arc::new(GeminiClient::new(
                config.google_api_key.clone(),
                http,
            )))
            .with_optional_wallet(wallet)
            .with_models(config.extraction_model.clone(), config.chat_model.clone())
            .with_chat_context_limit(config.chat_context_max_receipts))
    }

    pub fn with_security(mut self, security_config: SecurityConfig) -> Self {
        self.security_config = security_config;
        self
    }

    pub fn with_identity(mut self, identity: Arc<dyn IdentityVerifier>) -> Self {
        self.identity = Some(identity);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_model(mut self, model: Arc<dyn ModelClient>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn with_wallet(self, wallet: Arc<WalletService>) -> Self {
        self.with_optional_wallet(Some(wallet))
    }

    fn with_optional_wallet(mut self, wallet: Option<Arc<WalletService>>) -> Self {
        self.wallet = wallet;
        self
    }

    pub fn with_models(mut self, extraction: impl Into<String>, chat: impl Into<String>) -> Self {
        self.models = Some((extraction.into(), chat.into()));
        self
    }

    pub fn with_chat_context_limit(mut self, limit: usize) -> Self {
        self.chat_context_limit = limit;
        self
    }

    pub fn build(self) -> AppState {
        let http = reqwest::Client::new();

        let identity = self
            .identity
            .unwrap_or_else(|| Arc::new(GoogleIdentityVerifier::new(None, http.clone())));
        let store = self
            .store
            .unwrap_or_else(|| Arc::new(InMemoryStore::new()));
        let model = self
            .model
            .unwrap_or_else(|| Arc::new(GeminiClient::new(None, http)));

        let mut dispatcher = Dispatcher::new(model).with_chat_context_limit(self.chat_context_limit);
        if let Some((extraction, chat)) = self.models {
            dispatcher = dispatcher.with_models(extraction, chat);
        }

        let receipts = ReceiptRepo::new(store);
        info!(
            store = receipts.backend(),
            wallet = self.wallet.is_some(),
            "application state built"
        );

        AppState::new(
            self.security_config,
            identity,
            receipts,
            Arc::new(dispatcher),
            self.wallet,
        )
    }
}

impl Default for StateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn build_state() -> StateBuilder {
    StateBuilder::new()
}
