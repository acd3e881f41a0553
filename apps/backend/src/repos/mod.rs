//! Repositories over the document store.

pub mod receipts;

pub use receipts::ReceiptRepo;
