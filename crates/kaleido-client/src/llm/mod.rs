//! LLM vendor backends.
//!
//! Each vendor owns its wire format (request assembly, response parsing,
//! schema conversion); [`LlmRouter`] picks the backend from the requested
//! model, so nothing outside this module branches on the vendor.

mod gemini;
mod openai;
mod schema;

pub use gemini::GeminiBackend;
pub use openai::OpenAiBackend;
pub use schema::{GeminiSchema, SchemaType, convert_schema};

use kaleido_core::error::AppError;
use kaleido_core::models::{AiReply, AskRequest, Vendor};
use kaleido_core::schema::validate_response_schema;
use kaleido_core::traits::LlmBackend;

/// Dispatches requests to the vendor owning the requested model.
#[derive(Clone)]
pub struct LlmRouter {
    openai: OpenAiBackend,
    gemini: GeminiBackend,
}

impl LlmRouter {
    pub fn new(openai: OpenAiBackend, gemini: GeminiBackend) -> Self {
        Self { openai, gemini }
    }
}

impl LlmBackend for LlmRouter {
    async fn ask(&self, request: &AskRequest) -> Result<AiReply, AppError> {
        if let Some(schema) = request.response_format.as_ref().and_then(inner_schema) {
            validate_response_schema(schema)?;
        }

        match request.model.vendor() {
            Vendor::OpenAi => self.openai.ask(request).await,
            Vendor::Gemini => self.gemini.ask(request).await,
        }
    }
}

/// The client sends an OpenAI-style `response_format`; the JSON schema
/// itself lives at `json_schema.schema` inside it.
pub(crate) fn inner_schema(response_format: &serde_json::Value) -> Option<&serde_json::Value> {
    response_format.get("json_schema")?.get("schema")
}
