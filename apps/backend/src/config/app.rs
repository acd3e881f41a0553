//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. Tests build an [`AppConfig`] from a
//! plain map through [`AppConfig::from_lookup`] instead of touching the
//! process environment.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;

use crate::error::AppError;
use crate::services::dispatcher::{
    DEFAULT_CHAT_CONTEXT_MAX_RECEIPTS, DEFAULT_CHAT_MODEL, DEFAULT_EXTRACTION_MODEL,
};
use crate::state::security_config::{SecurityConfig, DEFAULT_SESSION_TTL};
use crate::wallet::object::{DEFAULT_CLASS_SUFFIX, DEFAULT_CURRENCY_SYMBOL};
use crate::wallet::WalletSettings;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://127.0.0.1:5173";
const CLIENT_ID_VARS: [&str; 3] = ["GOOGLE_CLIENT_ID", "CLIENT_ID", "client_id"];

/// Where receipts live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreConfig {
    Memory,
    Firestore {
        credentials: PathBuf,
        /// Falls back to the key file's `project_id` when unset
        project_id: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletConfig {
    pub credentials: PathBuf,
    pub settings: WalletSettings,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    // Server
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,

    // Identity and sessions
    pub google_client_id: Option<String>,
    pub security: SecurityConfig,

    // Model
    pub google_api_key: Option<String>,
    pub extraction_model: String,
    pub chat_model: String,
    pub chat_context_max_receipts: usize,

    pub store: StoreConfig,
    /// `None` when no wallet credentials are configured
    pub wallet: Option<WalletConfig>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_map(vars: &HashMap<String, String>) -> Result<Self, AppError> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    /// Build the configuration from any key lookup. Blank values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = get("BACKEND_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = parse_or("BACKEND_PORT", get("BACKEND_PORT"), DEFAULT_PORT)?;

        let cors_allowed_origins = parse_origins(
            get("CORS_ALLOWED_ORIGINS")
                .as_deref()
                .unwrap_or(DEFAULT_CORS_ORIGINS),
        );

        let google_client_id = CLIENT_ID_VARS.iter().find_map(|&key| get(key));

        let jwt_secret = get("JWT_SECRET").ok_or_else(|| AppError::config("JWT_SECRET must be set"))?;
        let algorithm = match get("JWT_ALGORITHM") {
            Some(name) => Algorithm::from_str(&name)
                .map_err(|_| AppError::config(format!("JWT_ALGORITHM '{name}' is not recognized")))?,
            None => Algorithm::HS256,
        };
        let session_minutes = parse_or(
            "JWT_EXP_MINUTES",
            get("JWT_EXP_MINUTES"),
            DEFAULT_SESSION_TTL.as_secs() / 60,
        )?;
        if session_minutes == 0 {
            return Err(AppError::config("JWT_EXP_MINUTES must be greater than zero"));
        }
        let security = SecurityConfig::new(jwt_secret.into_bytes())
            .with_algorithm(algorithm)?
            .with_session_ttl(Duration::from_secs(session_minutes * 60));

        let chat_context_max_receipts = parse_or(
            "CHAT_CONTEXT_MAX_RECEIPTS",
            get("CHAT_CONTEXT_MAX_RECEIPTS"),
            DEFAULT_CHAT_CONTEXT_MAX_RECEIPTS,
        )?;

        let store = match get("STORE_BACKEND").as_deref().unwrap_or("firestore") {
            "memory" => StoreConfig::Memory,
            "firestore" => StoreConfig::Firestore {
                credentials: get("FIRESTORE_CREDENTIALS")
                    .map(PathBuf::from)
                    .ok_or_else(|| {
                        AppError::config("FIRESTORE_CREDENTIALS must be set when STORE_BACKEND=firestore")
                    })?,
                project_id: get("FIRESTORE_PROJECT_ID"),
            },
            other => {
                return Err(AppError::config(format!(
                    "STORE_BACKEND must be 'firestore' or 'memory', got '{other}'"
                )))
            }
        };

        let wallet = match get("WALLET_CREDENTIALS") {
            Some(path) => {
                let issuer_id = get("WALLET_ISSUER_ID").ok_or_else(|| {
                    AppError::config("WALLET_ISSUER_ID must be set when WALLET_CREDENTIALS is set")
                })?;
                Some(WalletConfig {
                    credentials: PathBuf::from(path),
                    settings: WalletSettings {
                        issuer_id,
                        class_suffix: get("WALLET_CLASS_SUFFIX")
                            .unwrap_or_else(|| DEFAULT_CLASS_SUFFIX.to_string()),
                        currency_symbol: get("WALLET_CURRENCY_SYMBOL")
                            .unwrap_or_else(|| DEFAULT_CURRENCY_SYMBOL.to_string()),
                    },
                })
            }
            None => None,
        };

        Ok(AppConfig {
            host,
            port,
            cors_allowed_origins,
            google_client_id,
            security,
            google_api_key: get("GOOGLE_API_KEY"),
            extraction_model: get("GEMINI_EXTRACTION_MODEL")
                .unwrap_or_else(|| DEFAULT_EXTRACTION_MODEL.to_string()),
            chat_model: get("GEMINI_CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            chat_context_max_receipts,
            store,
            wallet,
        })
    }
}

fn parse_or<T: FromStr>(name: &str, raw: Option<String>, default: T) -> Result<T, AppError> {
    match raw {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| AppError::config(format!("{name} has an invalid value '{value}'"))),
        None => Ok(default),
    }
}

/// Comma-separated origins; blank, `null` and non-http entries are dropped.
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "null")
        .filter(|s| s.starts_with("http://") || s.starts_with("https://"))
        .map(str::to_string)
        .collect()
}
