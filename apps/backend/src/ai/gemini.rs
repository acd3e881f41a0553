//! Gemini REST client.
//!
//! Images go through the resumable upload protocol (`start`, then
//! `upload, finalize`) and are then referenced from `generateContent` by URI.

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;

use super::trait_def::{GenerationRequest, ModelClient, ModelError, UploadedFile};

pub const GEMINI_API: &str = "https://generativelanguage.googleapis.com";
const API_KEY_HEADER: &str = "x-goog-api-key";
const UPLOAD_URL_HEADER: &str = "x-goog-upload-url";

pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: Option<String>, client: Client) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url: GEMINI_API.to_string(),
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn api_key(&self) -> Result<&str, ModelError> {
        self.api_key.as_deref().ok_or(ModelError::NotConfigured)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    File {
        #[serde(rename = "fileData")]
        file_data: FileData,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct FileData {
    mime_type: String,
    file_uri: String,
}

#[derive(Serialize, Default)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    thinking_config: Option<ThinkingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ThinkingConfig {
    thinking_budget: u32,
}

#[derive(Deserialize, Default)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct UploadResponse {
    file: UploadedFileInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedFileInfo {
    uri: String,
    #[serde(default)]
    mime_type: Option<String>,
}

fn build_request_body(request: &GenerationRequest) -> GenerateContentRequest {
    let mut parts = vec![Part::Text {
        text: request.prompt.clone(),
    }];
    if let Some(file) = &request.file {
        parts.push(Part::File {
            file_data: FileData {
                mime_type: file.mime_type.clone(),
                file_uri: file.uri.clone(),
            },
        });
    }

    GenerateContentRequest {
        contents: vec![Content {
            role: "user",
            parts,
        }],
        generation_config: GenerationConfig {
            temperature: request.temperature,
            thinking_config: request
                .thinking_budget
                .map(|thinking_budget| ThinkingConfig { thinking_budget }),
            response_mime_type: request
                .response_schema
                .as_ref()
                .map(|_| "application/json"),
            response_schema: request.response_schema.clone(),
        },
    }
}

/// Text of the first candidate's first text part.
fn first_text(response: GenerateContentResponse) -> Result<String, ModelError> {
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().find_map(|p| p.text))
        .ok_or(ModelError::EmptyResponse)
}

async fn expect_success(response: reqwest::Response) -> Result<reqwest::Response, ModelError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ModelError::Rejected {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl ModelClient for GeminiClient {
    async fn upload(
        &self,
        bytes: Bytes,
        mime_type: &str,
        display_name: &str,
    ) -> Result<UploadedFile, ModelError> {
        let api_key = self.api_key()?;

        let start = self
            .client
            .post(format!("{}/upload/v1beta/files", self.base_url))
            .header(API_KEY_HEADER, api_key)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", bytes.len())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&json!({ "file": { "display_name": display_name } }))
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;
        let start = expect_success(start).await?;

        let upload_url = start
            .headers()
            .get(UPLOAD_URL_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ModelError::Decode("upload session URL missing".to_string()))?;

        let size = bytes.len();
        let finished = self
            .client
            .post(upload_url)
            .header("X-Goog-Upload-Offset", 0)
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(bytes)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;
        let finished = expect_success(finished).await?;

        let info: UploadResponse = finished
            .json()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))?;

        debug!(size, mime_type, uri = %info.file.uri, "uploaded file to Gemini");
        Ok(UploadedFile {
            uri: info.file.uri,
            mime_type: info.file.mime_type.unwrap_or_else(|| mime_type.to_string()),
        })
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<String, ModelError> {
        let api_key = self.api_key()?;
        let body = build_request_body(request);

        debug!(model = %request.model, with_file = request.file.is_some(), "Sending request to Gemini");

        let response = self
            .client
            .post(format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, request.model
            ))
            .header(API_KEY_HEADER, api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ModelError::Transport(e.to_string()))?;
        let response = expect_success(response).await?;

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ModelError::Decode(e.to_string()))?;
        first_text(parsed)
    }
}
