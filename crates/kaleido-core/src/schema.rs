use crate::error::AppError;

/// Validate a client-supplied JSON response schema by compiling it.
///
/// Runs before any vendor call so a malformed schema fails the request
/// instead of producing an opaque vendor error.
pub fn validate_response_schema(schema: &serde_json::Value) -> Result<(), AppError> {
    jsonschema::validator_for(schema)
        .map(|_| ())
        .map_err(|e| AppError::SchemaError(format!("Invalid response schema: {e}")))
}
