//! JSON Schema → Gemini schema conversion.
//!
//! Gemini constrains structured output with its own schema type rather than
//! raw JSON Schema, so the client-supplied schema is translated recursively.
//! Recursion bottoms out on schemas without nested `properties`/`items`.

use std::collections::BTreeMap;

use serde::Serialize;

use kaleido_core::error::AppError;

/// Gemini's native schema representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeminiSchema {
    #[serde(rename = "type")]
    pub schema_type: SchemaType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub properties: Option<BTreeMap<String, GeminiSchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<GeminiSchema>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SchemaType {
    #[serde(rename = "TYPE_UNSPECIFIED")]
    Unspecified,
    #[serde(rename = "STRING")]
    String,
    #[serde(rename = "NUMBER")]
    Number,
    #[serde(rename = "INTEGER")]
    Integer,
    #[serde(rename = "BOOLEAN")]
    Boolean,
    #[serde(rename = "ARRAY")]
    Array,
    #[serde(rename = "OBJECT")]
    Object,
}

impl SchemaType {
    /// Map a JSON Schema `type` string; anything unknown is unspecified.
    fn from_json_type(json_type: &str) -> Self {
        match json_type {
            "object" => SchemaType::Object,
            "array" => SchemaType::Array,
            "string" => SchemaType::String,
            "number" => SchemaType::Number,
            "boolean" => SchemaType::Boolean,
            "integer" => SchemaType::Integer,
            _ => SchemaType::Unspecified,
        }
    }
}

/// Convert a JSON-Schema-like value into Gemini's representation.
pub fn convert_schema(schema: &serde_json::Value) -> Result<GeminiSchema, AppError> {
    let schema_type = match schema.get("type") {
        None => SchemaType::Unspecified,
        Some(value) => {
            let name = value.as_str().ok_or_else(|| {
                AppError::SchemaError(format!("schema `type` must be a string, got: {value}"))
            })?;
            SchemaType::from_json_type(name)
        }
    };

    let description = schema
        .get("description")
        .and_then(|d| d.as_str())
        .map(str::to_string);

    let properties = match schema.get("properties") {
        None => None,
        Some(value) => {
            let map = value.as_object().ok_or_else(|| {
                AppError::SchemaError("schema `properties` must be an object".into())
            })?;
            let mut converted = BTreeMap::new();
            for (key, prop) in map {
                if !prop.is_object() {
                    return Err(AppError::SchemaError(format!(
                        "invalid property schema for `{key}`"
                    )));
                }
                converted.insert(key.clone(), convert_schema(prop)?);
            }
            Some(converted)
        }
    };

    let items = if schema_type == SchemaType::Array {
        let items = schema.get("items").filter(|i| i.is_object()).ok_or_else(|| {
            AppError::SchemaError("array schema is missing an object `items`".into())
        })?;
        Some(Box::new(convert_schema(items)?))
    } else {
        None
    };

    let required = schema.get("required").and_then(|r| r.as_array()).map(|r| {
        r.iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect()
    });

    Ok(GeminiSchema {
        schema_type,
        description,
        properties,
        items,
        required,
    })
}
