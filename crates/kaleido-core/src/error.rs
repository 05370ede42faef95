use thiserror::Error;

/// Application-wide error types for Kaleido.
///
/// Every outbound failure is typed and recoverable per request; nothing in
/// request scope is allowed to terminate the process.
#[derive(Error, Debug)]
pub enum AppError {
    /// HTTP request failed (portal page or image origin).
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// LLM vendor call failed.
    #[error("{vendor} error (HTTP {status_code}): {message}")]
    LlmError {
        vendor: &'static str,
        message: String,
        status_code: u16,
        retryable: bool,
    },

    /// Client-supplied response schema could not be validated or converted.
    #[error("Schema error: {0}")]
    SchemaError(String),

    /// Request input is malformed (unknown model, bad data URI, bad id).
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// JSON serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Request timed out.
    #[error("Request timed out after {0} seconds")]
    Timeout(u64),

    /// Rate limit exceeded.
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Network/connection error.
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Blob store operation failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Missing or invalid configuration.
    #[error("Config error: {0}")]
    ConfigError(String),
}

impl AppError {
    /// Returns true if this error is transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::NetworkError(_) | AppError::Timeout(_) | AppError::RateLimitExceeded => true,
            AppError::LlmError { retryable, .. } => *retryable,
            AppError::HttpError(msg) => {
                msg.contains("timeout") || msg.contains("connect") || msg.contains("reset")
            }
            _ => false,
        }
    }
}
