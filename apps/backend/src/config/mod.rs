pub mod app;

pub use app::{AppConfig, StoreConfig, WalletConfig};
