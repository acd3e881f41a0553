#![deny(clippy::wildcard_imports)]
#![cfg_attr(test, allow(clippy::wildcard_imports))]

pub mod ai;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod errors;
pub mod extractors;
pub mod google;
pub mod infra;
pub mod logging;
pub mod middleware;
pub mod repos;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod test_support;
pub mod trace_ctx;
pub mod wallet;

// Re-exports for public API
pub use auth::{mint_session_token, verify_session_token, AuthenticatedUser};
pub use config::AppConfig;
pub use error::AppError;
pub use extractors::{AuthToken, CurrentUser};
pub use infra::{build_state, StateBuilder};
pub use middleware::{cors_middleware, RequestTrace, StructuredLogger, TraceSpan};
pub use state::{AppState, SecurityConfig};

// Auto-initialize logging for unit tests
#[cfg(test)]
#[ctor::ctor]
fn init_test_logging() {
    raseed_test_support::logging::init();
}
