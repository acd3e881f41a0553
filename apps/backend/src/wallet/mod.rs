//! Google Wallet generic passes for saved receipts.

pub mod issuer;
pub mod object;

pub use issuer::{GoogleWalletIssuer, InsertOutcome, WalletIssuer, WalletIssuerError};
pub use object::{build_generic_object, GenericObject, WalletSettings};
