//! Routes a request to the model in extraction or conversational mode.

use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::ai::prompts::{chat_prompt, extraction_prompt, receipt_schema};
use crate::ai::{GenerationRequest, ModelClient};
use crate::domain::{Item, PurchaseType, Receipt};
use crate::error::AppError;

pub const DEFAULT_EXTRACTION_MODEL: &str = "gemini-2.5-flash-lite";
pub const DEFAULT_CHAT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_CHAT_CONTEXT_MAX_RECEIPTS: usize = 50;
const THINKING_BUDGET: u32 = 100;
const CHAT_TEMPERATURE: f32 = 0.5;

/// An uploaded image as received from the client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl ImageUpload {
    /// JPEG or PNG mime type, judged by file extension and then by the
    /// declared content type.
    pub fn mime_type(&self) -> Result<&'static str, AppError> {
        let by_extension = self
            .filename
            .as_deref()
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .and_then(|ext| match ext.to_ascii_lowercase().as_str() {
                "jpg" | "jpeg" => Some("image/jpeg"),
                "png" => Some("image/png"),
                _ => None,
            });
        let by_content_type = || match self.content_type.as_deref() {
            Some("image/jpeg") | Some("image/jpg") => Some("image/jpeg"),
            Some("image/png") => Some("image/png"),
            _ => None,
        };

        by_extension
            .or_else(by_content_type)
            .ok_or_else(|| AppError::invalid_image("Only .jpg, .jpeg and .png images are supported"))
    }
}

#[derive(Debug, Clone)]
pub struct ExtractRequest {
    pub image: ImageUpload,
}

#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub prompt: String,
    /// Caller's receipts, newest first.
    pub receipts: Vec<Receipt>,
}

#[derive(Debug, Clone)]
pub enum DispatchRequest {
    Extract(ExtractRequest),
    Chat(ChatRequest),
}

/// Receipt as read off an image. Unlike stored records this is parsed
/// strictly; a missing or mistyped field is an extraction failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedReceipt {
    pub type_of_purchase: PurchaseType,
    pub date: String,
    pub establishment_name: String,
    pub items: Vec<Item>,
    pub total: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Extracted(ExtractedReceipt),
    Reply(String),
}

/// Drop a surrounding markdown code fence, if the model added one.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.split_once('\n') {
        Some((_lang, body)) => body,
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

pub fn parse_extraction(text: &str) -> Result<ExtractedReceipt, AppError> {
    serde_json::from_str(strip_code_fence(text)).map_err(|e| {
        warn!(error = %e, "model output did not match receipt schema");
        AppError::extraction(format!("Model output did not match the receipt schema: {e}"))
    })
}

pub struct Dispatcher {
    model: Arc<dyn ModelClient>,
    extraction_model: String,
    chat_model: String,
    chat_context_limit: usize,
}

impl Dispatcher {
    pub fn new(model: Arc<dyn ModelClient>) -> Self {
        Self {
            model,
            extraction_model: DEFAULT_EXTRACTION_MODEL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            chat_context_limit: DEFAULT_CHAT_CONTEXT_MAX_RECEIPTS,
        }
    }

    pub fn with_models(mut self, extraction: impl Into<String>, chat: impl Into<String>) -> Self {
        self.extraction_model = extraction.into();
        self.chat_model = chat.into();
        self
    }

    pub fn with_chat_context_limit(mut self, limit: usize) -> Self {
        self.chat_context_limit = limit;
        self
    }

    pub async fn dispatch(&self, request: DispatchRequest) -> Result<DispatchOutcome, AppError> {
        match request {
            DispatchRequest::Extract(req) => self.extract(req).await.map(DispatchOutcome::Extracted),
            DispatchRequest::Chat(req) => self.chat(req).await.map(DispatchOutcome::Reply),
        }
    }

    async fn extract(&self, request: ExtractRequest) -> Result<ExtractedReceipt, AppError> {
        let image = request.image;
        let mime_type = image.mime_type()?;
        if image.bytes.is_empty() {
            return Err(AppError::invalid_image("Uploaded image is empty"));
        }

        let display_name = image.filename.as_deref().unwrap_or("receipt");
        let file = self
            .model
            .upload(image.bytes.clone(), mime_type, display_name)
            .await?;

        let text = self
            .model
            .generate(&GenerationRequest {
                model: self.extraction_model.clone(),
                prompt: extraction_prompt(),
                file: Some(file),
                temperature: None,
                thinking_budget: Some(THINKING_BUDGET),
                response_schema: Some(receipt_schema()),
            })
            .await?;

        let extracted = parse_extraction(&text)?;
        info!(items = extracted.items.len(), "receipt extracted");
        Ok(extracted)
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, AppError> {
        let prompt = request.prompt.trim();
        if prompt.is_empty() {
            return Err(AppError::invalid_request("Prompt must not be empty"));
        }

        let receipts = &request.receipts[..request.receipts.len().min(self.chat_context_limit)];
        debug!(
            context_receipts = receipts.len(),
            available = request.receipts.len(),
            "building chat context"
        );

        let reply = self
            .model
            .generate(&GenerationRequest {
                model: self.chat_model.clone(),
                prompt: chat_prompt(prompt, receipts),
                file: None,
                temperature: Some(CHAT_TEMPERATURE),
                thinking_budget: Some(THINKING_BUDGET),
                response_schema: None,
            })
            .await?;

        Ok(reply.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::json;

    use super::*;
    use crate::ai::{ModelError, UploadedFile};
    use crate::domain::{normalize, RawRecord};

    #[derive(Default)]
    struct ScriptedModel {
        reply: String,
        requests: Mutex<Vec<GenerationRequest>>,
        uploads: Mutex<Vec<String>>,
    }

    impl ScriptedModel {
        fn replying(reply: &str) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.to_string(),
                ..Default::default()
            })
        }
    }

    #[async_trait]
    impl ModelClient for ScriptedModel {
        async fn upload(
            &self,
            _bytes: Bytes,
            mime_type: &str,
            _display_name: &str,
        ) -> Result<UploadedFile, ModelError> {
            self.uploads.lock().push(mime_type.to_string());
            Ok(UploadedFile {
                uri: "files/1".to_string(),
                mime_type: mime_type.to_string(),
            })
        }

        async fn generate(&self, request: &GenerationRequest) -> Result<String, ModelError> {
            self.requests.lock().push(request.clone());
            Ok(self.reply.clone())
        }
    }

    fn image(filename: &str) -> ImageUpload {
        ImageUpload {
            filename: Some(filename.to_string()),
            content_type: None,
            bytes: Bytes::from_static(b"\x89PNG"),
        }
    }

    const EXTRACTED: &str = r#"{"type_of_purchase":"Restaurant","date":"2025-03-01","establishment_name":"Cafe","items":[{"name":"Tea","price":9.5,"quantity":1}],"total":9.5}"#;

    #[tokio::test]
    async fn extract_uploads_then_parses() {
        let model = ScriptedModel::replying(EXTRACTED);
        let dispatcher = Dispatcher::new(model.clone());

        let outcome = dispatcher
            .dispatch(DispatchRequest::Extract(ExtractRequest {
                image: image("bill.PNG"),
            }))
            .await
            .unwrap();

        let DispatchOutcome::Extracted(receipt) = outcome else {
            panic!("expected extraction");
        };
        assert_eq!(receipt.type_of_purchase, PurchaseType::Restaurant);
        assert_eq!(receipt.items[0].name, "Tea");
        assert_eq!(model.uploads.lock().as_slice(), ["image/png"]);

        let requests = model.requests.lock();
        assert_eq!(requests[0].model, DEFAULT_EXTRACTION_MODEL);
        assert_eq!(requests[0].thinking_budget, Some(100));
        assert!(requests[0].response_schema.is_some());
    }

    #[tokio::test]
    async fn unsupported_upload_is_invalid_request() {
        let dispatcher = Dispatcher::new(ScriptedModel::replying(EXTRACTED));

        let err = dispatcher
            .dispatch(DispatchRequest::Extract(ExtractRequest {
                image: image("notes.txt"),
            }))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidRequest { .. }));
    }

    #[test]
    fn content_type_is_used_without_extension() {
        let upload = ImageUpload {
            filename: None,
            content_type: Some("image/jpeg".to_string()),
            bytes: Bytes::from_static(b"x"),
        };
        assert_eq!(upload.mime_type().unwrap(), "image/jpeg");
    }

    #[test]
    fn fenced_and_bare_json_both_parse() {
        let fenced = format!("```json\n{EXTRACTED}\n```");
        assert_eq!(
            parse_extraction(&fenced).unwrap(),
            parse_extraction(EXTRACTED).unwrap()
        );
    }

    #[test]
    fn schema_violations_are_extraction_errors() {
        let cases = [
            "not json",
            r#"{"type_of_purchase":"Groceries","date":"","establishment_name":"","items":[],"total":0}"#,
            r#"{"type_of_purchase":"Retail","date":"","establishment_name":"","total":0}"#,
        ];
        for case in cases {
            assert!(
                matches!(parse_extraction(case), Err(AppError::Extraction { .. })),
                "{case}"
            );
        }
    }

    #[tokio::test]
    async fn chat_caps_context_and_trims_reply() {
        let model = ScriptedModel::replying("  You spent 30.  \n");
        let dispatcher = Dispatcher::new(model.clone()).with_chat_context_limit(2);
        let receipts: Vec<Receipt> = ["newest", "middle", "oldest"]
            .iter()
            .map(|name| {
                normalize(&RawRecord::from(
                    json!({ "establishment_name": name })
                        .as_object()
                        .cloned()
                        .unwrap(),
                ))
            })
            .collect();

        let outcome = dispatcher
            .dispatch(DispatchRequest::Chat(ChatRequest {
                prompt: "How much?".to_string(),
                receipts,
            }))
            .await
            .unwrap();

        assert_eq!(outcome, DispatchOutcome::Reply("You spent 30.".to_string()));
        let requests = model.requests.lock();
        assert_eq!(requests[0].model, DEFAULT_CHAT_MODEL);
        assert_eq!(requests[0].temperature, Some(0.5));
        assert!(requests[0].prompt.contains("newest"));
        assert!(!requests[0].prompt.contains("oldest"));
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected() {
        let model = ScriptedModel::replying("unused");
        let dispatcher = Dispatcher::new(model.clone());

        let err = dispatcher
            .dispatch(DispatchRequest::Chat(ChatRequest {
                prompt: "   ".to_string(),
                receipts: Vec::new(),
            }))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidRequest { .. }));
        assert!(model.requests.lock().is_empty());
    }
}
