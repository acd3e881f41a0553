use actix_web::web;

use crate::error::AppError;

pub mod auth;
pub mod health;
pub mod llm;
pub mod receipts;
pub mod reply;

/// JSON bodies that fail to deserialize become 400 problem+json.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err, _req| AppError::invalid_request(err.to_string()).into())
}

/// Register every endpoint. Used by `main.rs` and by the integration tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config());

    // Health check: /health
    cfg.service(web::scope("/health").configure(health::configure_routes));

    // Sign-in and session: /auth/**
    cfg.service(web::scope("/auth").configure(auth::configure_routes));

    // Receipt endpoints sit at the root.
    cfg.configure(receipts::configure_routes);
    cfg.configure(llm::configure_routes);
}
