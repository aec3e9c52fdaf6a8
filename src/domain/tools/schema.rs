//! Manual parameter validation against tool JSON Schemas.
//!
//! Checks the two things the engine guarantees before a handler runs:
//! required fields are present and declared primitive types match. Deeper
//! schema features (enums, ranges, nested shapes) stay the handler's
//! responsibility.

use serde_json::Value;
use thiserror::Error;

/// Violations found while validating parsed tool arguments.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    #[error("parameters must be a JSON object, got {actual}")]
    NotAnObject { actual: &'static str },

    #[error("missing required field '{field}'")]
    MissingRequired { field: String },

    #[error("field '{field}' must be of type {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: String,
        actual: &'static str,
    },
}

/// Validates parsed arguments against a tool's parameter schema.
///
/// The schema is the `parameters` object of the OpenAI function format:
/// an object schema with optional `required` and `properties` sections.
pub fn validate_parameters(schema: &Value, arguments: &Value) -> Result<(), SchemaError> {
    let Some(object) = arguments.as_object() else {
        return Err(SchemaError::NotAnObject {
            actual: json_type_name(arguments),
        });
    };

    if let Some(required) = schema.get("required").and_then(Value::as_array) {
        for field in required.iter().filter_map(Value::as_str) {
            if !object.contains_key(field) {
                return Err(SchemaError::MissingRequired {
                    field: field.to_string(),
                });
            }
        }
    }

    if let Some(properties) = schema.get("properties").and_then(Value::as_object) {
        for (field, property) in properties {
            let Some(value) = object.get(field) else {
                continue;
            };
            let Some(expected) = property.get("type").and_then(Value::as_str) else {
                continue;
            };
            if !type_matches(expected, value) {
                return Err(SchemaError::TypeMismatch {
                    field: field.clone(),
                    expected: expected.to_string(),
                    actual: json_type_name(value),
                });
            }
        }
    }

    Ok(())
}

fn type_matches(expected: &str, value: &Value) -> bool {
    match expected {
        "string" => value.is_string(),
        "integer" => value.is_i64() || value.is_u64(),
        "number" => value.is_number(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "object" => value.is_object(),
        "null" => value.is_null(),
        // unknown type keyword: do not reject what we cannot check
        _ => true,
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
