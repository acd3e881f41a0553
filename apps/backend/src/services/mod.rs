//! Request-level services sitting between routes and the external clients.

pub mod dispatcher;
pub mod wallet;

pub use dispatcher::{
    ChatRequest, DispatchOutcome, DispatchRequest, Dispatcher, ExtractRequest, ExtractedReceipt,
    ImageUpload,
};
pub use wallet::WalletService;
