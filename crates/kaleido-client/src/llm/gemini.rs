use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use kaleido_core::error::AppError;
use kaleido_core::models::{AiReply, AskRequest};
use kaleido_core::traits::LlmBackend;

use super::inner_schema;
use super::schema::{GeminiSchema, convert_schema};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
const VENDOR: &str = "gemini";

/// Generative-content backend for Gemini models.
///
/// Images arrive as data URIs and are decoded into `inline_data` blobs; a
/// client-supplied response schema is converted into Gemini's native schema
/// representation.
#[derive(Clone)]
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: String,
    timeout_secs: u64,
}

impl GeminiBackend {
    pub fn new(api_key: &str) -> Result<Self, AppError> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .map_err(|e| AppError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        })
    }

    fn build_request(&self, request: &AskRequest) -> Result<GenerateRequest, AppError> {
        let mut parts = Vec::new();
        if let Some(image) = &request.image_data {
            // Image first, then the prompt text.
            parts.push(Part::Inline {
                inline_data: decode_data_uri(image)?,
            });
        }
        parts.push(Part::Text {
            text: request.prompt.clone(),
        });

        let mut generation_config = GenerationConfig {
            temperature: request.temperature,
            response_mime_type: None,
            response_schema: None,
        };
        if let Some(schema) = request.response_format.as_ref().and_then(inner_schema) {
            generation_config.response_schema = Some(convert_schema(schema)?);
            generation_config.response_mime_type = Some("application/json");
        }

        Ok(GenerateRequest {
            system_instruction: request.system_instructions.as_ref().map(|text| Content {
                role: "user",
                parts: vec![Part::Text { text: text.clone() }],
            }),
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config,
        })
    }
}

// ---- Gemini API types ----

#[derive(Debug, Serialize)]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text { text: String },
    Inline { inline_data: Blob },
}

#[derive(Debug, Serialize)]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f64,
    #[serde(rename = "responseMimeType", skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
    #[serde(rename = "responseSchema", skip_serializing_if = "Option::is_none")]
    response_schema: Option<GeminiSchema>,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u64>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u64>,
}

#[derive(Deserialize)]
struct ApiError {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl LlmBackend for GeminiBackend {
    async fn ask(&self, request: &AskRequest) -> Result<AiReply, AppError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            request.model.api_name(),
            self.api_key
        );
        let body = self.build_request(request)?;

        let response = self.client.post(&url).json(&body).send().await.map_err(|e| {
            if e.is_timeout() {
                AppError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                AppError::NetworkError(format!("Connection failed: {e}"))
            } else {
                AppError::HttpError(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let status_code = status.as_u16();
            let body = response.text().await.unwrap_or_default();

            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("HTTP {status_code}: {body}"));

            if status_code == 429 {
                return Err(AppError::RateLimitExceeded);
            }

            return Err(AppError::LlmError {
                vendor: VENDOR,
                message,
                status_code,
                retryable: status_code >= 500,
            });
        }

        let generate_response: GenerateResponse = response
            .json()
            .await
            .map_err(|e| AppError::HttpError(format!("Failed to parse gemini response: {e}")))?;

        if let Some(usage) = &generate_response.usage_metadata {
            tracing::debug!(
                input_tokens = usage.prompt_token_count.unwrap_or(0),
                output_tokens = usage.candidates_token_count.unwrap_or(0),
                "gemini token usage"
            );
        }

        let message = generate_response
            .candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .and_then(|content| content.parts.first())
            .and_then(|part| part.text.clone())
            .ok_or_else(|| AppError::LlmError {
                vendor: VENDOR,
                message: "Empty response".into(),
                status_code: status.as_u16(),
                retryable: false,
            })?;

        Ok(AiReply { message })
    }
}

/// Split a `data:<mime>;base64,<payload>` URI into an inline blob.
///
/// The payload is decoded to verify it is valid base64; the API receives it
/// base64-encoded, so the original payload string is forwarded.
fn decode_data_uri(uri: &str) -> Result<Blob, AppError> {
    let (header, payload) = uri
        .split_once(";base64,")
        .ok_or_else(|| AppError::InvalidInput("image must be a base64 data URI".into()))?;

    let mime_type = header
        .strip_prefix("data:")
        .filter(|mime| !mime.is_empty())
        .ok_or_else(|| AppError::InvalidInput("image data URI has no mime type".into()))?;

    BASE64
        .decode(payload)
        .map_err(|e| AppError::InvalidInput(format!("invalid base64 image payload: {e}")))?;

    Ok(Blob {
        mime_type: mime_type.to_string(),
        data: payload.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use kaleido_core::models::ModelKind;

    fn ask_request() -> AskRequest {
        AskRequest {
            model: ModelKind::Gemini15Flash,
            prompt: "describe the image".into(),
            image_data: None,
            system_instructions: None,
            temperature: 0.7,
            response_format: None,
        }
    }

    fn backend() -> GeminiBackend {
        GeminiBackend::new("test-key").unwrap()
    }

    #[test]
    fn test_request_has_user_content_and_temperature() {
        let json = serde_json::to_value(backend().build_request(&ask_request()).unwrap()).unwrap();

        assert!(json.get("system_instruction").is_none());
        assert_eq!(json["contents"][0]["role"], "user");
        assert_eq!(json["contents"][0]["parts"][0]["text"], "describe the image");
        assert_eq!(json["generationConfig"]["temperature"], 0.7);
        assert!(json["generationConfig"].get("responseSchema").is_none());
    }

    #[test]
    fn test_system_instruction_is_set() {
        let mut request = ask_request();
        request.system_instructions = Some("be terse".into());

        let json = serde_json::to_value(backend().build_request(&request).unwrap()).unwrap();
        assert_eq!(json["system_instruction"]["parts"][0]["text"], "be terse");
    }

    #[test]
    fn test_image_becomes_inline_data_before_text() {
        let mut request = ask_request();
        request.image_data = Some("data:image/png;base64,aGVsbG8=".into());

        let json = serde_json::to_value(backend().build_request(&request).unwrap()).unwrap();
        let parts = json["contents"][0]["parts"].as_array().unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["inline_data"]["mime_type"], "image/png");
        assert_eq!(parts[0]["inline_data"]["data"], "aGVsbG8=");
        assert_eq!(parts[1]["text"], "describe the image");
    }

    #[test]
    fn test_response_schema_is_converted() {
        let mut request = ask_request();
        request.response_format = Some(serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": "answer",
                "schema": {
                    "type": "object",
                    "properties": {"title": {"type": "string"}},
                    "required": ["title"]
                }
            }
        }));

        let json = serde_json::to_value(backend().build_request(&request).unwrap()).unwrap();
        let config = &json["generationConfig"];

        assert_eq!(config["responseMimeType"], "application/json");
        assert_eq!(config["responseSchema"]["type"], "OBJECT");
        assert_eq!(
            config["responseSchema"]["properties"]["title"]["type"],
            "STRING"
        );
        assert_eq!(config["responseSchema"]["required"][0], "title");
    }

    #[test]
    fn test_malformed_data_uri_is_rejected() {
        let mut request = ask_request();
        request.image_data = Some("not a data uri".into());

        let err = backend().build_request(&request).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_invalid_base64_payload_is_rejected() {
        let mut request = ask_request();
        request.image_data = Some("data:image/png;base64,!!!".into());

        let err = backend().build_request(&request).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_decode_data_uri_extracts_mime_type() {
        let blob = decode_data_uri("data:image/jpeg;base64,aGk=").unwrap();
        assert_eq!(blob.mime_type, "image/jpeg");
        assert_eq!(blob.data, "aGk=");
    }
}
