use std::sync::Arc;

use super::security_config::SecurityConfig;
use crate::auth::IdentityVerifier;
use crate::repos::ReceiptRepo;
use crate::services::{Dispatcher, WalletService};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    /// Session token signing settings
    pub security: SecurityConfig,
    /// Verifier for Google Sign-In credentials
    pub identity: Arc<dyn IdentityVerifier>,
    pub receipts: ReceiptRepo,
    pub dispatcher: Arc<Dispatcher>,
    /// Wallet flow, absent when no issuer is configured
    pub wallet: Option<Arc<WalletService>>,
}

impl AppState {
    pub fn new(
        security: SecurityConfig,
        identity: Arc<dyn IdentityVerifier>,
        receipts: ReceiptRepo,
        dispatcher: Arc<Dispatcher>,
        wallet: Option<Arc<WalletService>>,
    ) -> Self {
        Self {
            security,
            identity,
            receipts,
            dispatcher,
            wallet,
        }
    }

    pub fn store_backend(&self) -> &'static str {
        self.receipts.backend()
    }

    pub fn wallet_enabled(&self) -> bool {
        self.wallet.is_some()
    }
}
