#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use actix_web::body::BoxBody;
use actix_web::dev::ServiceResponse;
use actix_web::test;
use raseed_backend::auth::AuthenticatedUser;
use raseed_backend::google::ServiceAccount;
use raseed_backend::services::WalletService;
use raseed_backend::store::InMemoryStore;
use raseed_backend::test_support::{
    bearer, test_security, FakeModel, FakeWalletIssuer, StaticIdentityVerifier,
};
use raseed_backend::wallet::WalletSettings;
use raseed_backend::{build_state, AppState, StateBuilder};
use serde_json::Value;

pub const SERVICE_ACCOUNT: &str = include_str!("../fixtures/test_service_account.json");
pub const RSA_PUBLIC_KEY: &str = include_str!("../fixtures/test_rsa_public.pem");
pub const WALLET_ISSUER_ID: &str = "3388000000012345678";

// Logging is auto-installed for every test binary that declares `mod common`.
#[ctor::ctor]
fn init_logging() {
    raseed_test_support::logging::init();
}

/// Builder preloaded with the test signing secret and an in-memory store.
pub fn base_state() -> StateBuilder {
    build_state()
        .with_security(test_security())
        .with_store(Arc::new(InMemoryStore::new()))
}

pub fn wallet_service(issuer: Arc<FakeWalletIssuer>) -> Arc<WalletService> {
    let signer = ServiceAccount::from_json(SERVICE_ACCOUNT).expect("fixture service account");
    Arc::new(WalletService::new(
        issuer,
        signer,
        WalletSettings::new(WALLET_ISSUER_ID),
    ))
}

pub fn state_with_model(model: Arc<FakeModel>) -> AppState {
    base_state().with_model(model).build()
}

pub fn state_with_identity(identity: StaticIdentityVerifier) -> AppState {
    base_state().with_identity(Arc::new(identity)).build()
}

/// Fresh `Authorization` header value for `user` under the test secret.
pub fn auth_header(user: &AuthenticatedUser) -> String {
    bearer(user, &test_security(), Duration::ZERO)
}

pub async fn json_body(resp: ServiceResponse<BoxBody>) -> Value {
    let body = test::read_body(resp).await;
    serde_json::from_slice(&body).unwrap_or_else(|_| {
        panic!("expected JSON body, got {}", String::from_utf8_lossy(&body))
    })
}
