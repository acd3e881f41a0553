//! Receipt domain types and the normalization rules applied at the store
//! boundary.

pub mod normalize;
pub mod receipt;

pub use normalize::{normalize, normalize_item};
pub use receipt::{Item, PurchaseType, RawRecord, Receipt};
