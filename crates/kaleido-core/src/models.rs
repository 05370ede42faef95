use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A single scraped catalog entry.
///
/// `id` comes from the preview image filename, `hash_id` from the selection
/// link. Either may be empty when the source markup is malformed; callers
/// treat empty values as unusable rather than erroring.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub name: String,
    pub id: String,
    pub hash_id: String,
}

/// One scraped page of the effect catalog.
///
/// `dl_sec_key` is the security token taken from the first item's link;
/// empty when the page has no items or the first link carries no token.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EffectListPage {
    pub effects: Vec<Effect>,
    pub dl_sec_key: String,
    pub has_next: bool,
}

/// Outcome of a change-selection request.
///
/// An expired session clears both identifiers and reports `succeed = false`;
/// the caller must log in again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeOutcome {
    pub succeed: bool,
    pub session_id: String,
    pub dl_sec_key: String,
}

/// The models Kaleido can forward prompts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelKind {
    Gpt4o,
    Gpt4oMini,
    Gemini15Flash,
    Gemini15Pro,
}

/// The vendor owning a model's API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vendor {
    OpenAi,
    Gemini,
}

impl Vendor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Vendor::OpenAi => "openai",
            Vendor::Gemini => "gemini",
        }
    }
}

impl ModelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelKind::Gpt4o => "gpt-4o",
            ModelKind::Gpt4oMini => "gpt-4o-mini",
            ModelKind::Gemini15Flash => "gemini-1.5-flash",
            ModelKind::Gemini15Pro => "gemini-1.5-pro",
        }
    }

    /// The versioned model identifier sent to the vendor API.
    pub fn api_name(&self) -> &'static str {
        match self {
            ModelKind::Gpt4o => "gpt-4o-2024-08-06",
            ModelKind::Gpt4oMini => "gpt-4o-mini-2024-07-18",
            ModelKind::Gemini15Flash => "gemini-1.5-flash",
            ModelKind::Gemini15Pro => "gemini-1.5-pro",
        }
    }

    pub fn vendor(&self) -> Vendor {
        match self {
            ModelKind::Gpt4o | ModelKind::Gpt4oMini => Vendor::OpenAi,
            ModelKind::Gemini15Flash | ModelKind::Gemini15Pro => Vendor::Gemini,
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gpt-4o" => Ok(ModelKind::Gpt4o),
            "gpt-4o-mini" => Ok(ModelKind::Gpt4oMini),
            "gemini-1.5-flash" => Ok(ModelKind::Gemini15Flash),
            "gemini-1.5-pro" => Ok(ModelKind::Gemini15Pro),
            _ => Err(format!("Unknown model: {s}")),
        }
    }
}

/// A normalized LLM request, independent of the vendor wire format.
#[derive(Debug, Clone)]
pub struct AskRequest {
    pub model: ModelKind,
    pub prompt: String,
    /// Optional image as a `data:<mime>;base64,<payload>` URI.
    pub image_data: Option<String>,
    pub system_instructions: Option<String>,
    pub temperature: f64,
    /// OpenAI-style `response_format` value; the JSON schema itself lives
    /// at `json_schema.schema` inside it.
    pub response_format: Option<serde_json::Value>,
}

/// The single normalized output of any vendor call.
///
/// Token counts are logged for telemetry, never modeled here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AiReply {
    pub message: String,
}
