//! Generative model access.
//!
//! This module provides:
//! - `ModelClient`, the narrow seam the dispatcher talks to
//! - `GeminiClient`, the Gemini REST implementation
//! - the prompts and response schema used for receipt extraction and chat

pub mod gemini;
pub mod prompts;
mod trait_def;

pub use gemini::GeminiClient;
pub use trait_def::{GenerationRequest, ModelClient, ModelError, UploadedFile};
