//! Google service-account plumbing shared by the Firestore store and the
//! wallet issuer.

pub mod service_account;

pub use service_account::{ServiceAccount, ServiceAccountError};
