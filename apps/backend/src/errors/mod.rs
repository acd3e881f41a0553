//! Error handling for the receipt backend.

pub mod error_code;

pub use error_code::ErrorCode;
