use serde::{Deserialize, Serialize};

use kaleido_core::models::Effect;

// ---------------------------------------------------------------------------
// Effect list
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectListRequest {
    /// Empty to log in with the supplied credentials.
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub page: u32,
    #[serde(default)]
    pub mail_address: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectListResponse {
    pub session_id: String,
    pub dl_sec_key: String,
    pub effects: Vec<EffectDto>,
    pub is_next: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectDto {
    pub name: String,
    pub id: String,
    pub hash_id: String,
}

impl From<Effect> for EffectDto {
    fn from(effect: Effect) -> Self {
        Self {
            name: effect.name,
            id: effect.id,
            hash_id: effect.hash_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Change effect
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEffectRequest {
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub hash_id: String,
    #[serde(default)]
    pub dl_sec_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEffectResponse {
    pub succeed: bool,
    pub session_id: String,
    pub dl_sec_key: String,
}

// ---------------------------------------------------------------------------
// Effect image
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectImageRequest {
    #[serde(default)]
    pub effect_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EffectImageResponse {
    pub succeed: bool,
    /// Base64-encoded JPEG bytes.
    pub image: String,
}

// ---------------------------------------------------------------------------
// Ask AI
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskAiRequest {
    pub model: String,
    pub prompt: String,
    /// Optional image as a `data:<mime>;base64,<payload>` URI.
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub system_instructions: Option<String>,
    #[serde(default)]
    pub temperature: f64,
    /// OpenAI-style `response_format` value.
    #[serde(default)]
    pub response_format: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AskAiResponse {
    pub message: String,
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
