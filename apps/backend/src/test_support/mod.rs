//! In-process doubles and app wiring for tests.
//!
//! Everything here talks to nothing outside the process: the identity
//! verifier, model and wallet issuer are scripted fakes, and the store is
//! the in-memory one.

pub mod app_builder;
pub mod auth;
pub mod fakes;

pub use app_builder::{create_test_app, create_test_app_builder, TestAppBuilder};
pub use auth::{bearer, test_security, test_user, TEST_JWT_SECRET};
pub use fakes::{FakeModel, FakeWalletIssuer, StaticIdentityVerifier};
