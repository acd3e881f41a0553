//! Model client trait definition.

use async_trait::async_trait;
use bytes::Bytes;
use serde_json::Value;
use thiserror::Error;

use crate::error::AppError;

/// Errors from talking to the generative model.
#[derive(Debug, Error)]
pub enum ModelError {
    /// No API key configured
    #[error("GOOGLE_API_KEY is not configured")]
    NotConfigured,
    #[error("model request failed: {0}")]
    Transport(String),
    #[error("model rejected request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("model returned no text")]
    EmptyResponse,
    #[error("unreadable model response: {0}")]
    Decode(String),
}

impl From<ModelError> for AppError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::NotConfigured => AppError::config(err.to_string()),
            other => AppError::extraction(other.to_string()),
        }
    }
}

/// A file already uploaded to the model provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub uri: String,
    pub mime_type: String,
}

/// One `generateContent` call: a text prompt, optionally with a file.
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    pub model: String,
    pub prompt: String,
    pub file: Option<UploadedFile>,
    pub temperature: Option<f32>,
    pub thinking_budget: Option<u32>,
    /// When set, the model is asked for `application/json` matching this schema.
    pub response_schema: Option<Value>,
}

/// Trait for generative model backends.
///
/// Implementations return the model's text output unchanged; parsing and
/// validation belong to the caller.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn upload(
        &self,
        bytes: Bytes,
        mime_type: &str,
        display_name: &str,
    ) -> Result<UploadedFile, ModelError>;

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ModelError>;
}
