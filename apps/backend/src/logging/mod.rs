pub mod pii;

pub use pii::Redacted;
