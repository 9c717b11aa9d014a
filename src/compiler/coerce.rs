//! Per-type value coercion
//!
//! Every function here is total: bad input yields a typed error, never a panic.

use serde_json::Value;

use super::errors::{CompileError, CompileResult};
use crate::schema::{FieldDefinition, FieldType};
use crate::store::ContentValue;

/// Coerces a raw query string by the field's declared type.
///
/// - BOOLEAN: exactly `"true"` is true, anything else false
/// - ARRAY: parsed as a JSON array literal
/// - TEXT / NUMBER: passed through as a string
pub fn coerce_query_value(field: &FieldDefinition, raw: &str) -> CompileResult<Value> {
    match field.field_type {
        FieldType::Boolean => Ok(Value::Bool(raw == "true")),
        FieldType::Array => match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Array(_)) => Ok(value),
            Ok(_) => Err(CompileError::MalformedValue {
                field: field.name.clone(),
                reason: "expected a JSON array".to_string(),
            }),
            Err(e) => Err(CompileError::MalformedValue {
                field: field.name.clone(),
                reason: e.to_string(),
            }),
        },
        FieldType::Text | FieldType::Number => Ok(Value::String(raw.to_string())),
    }
}

/// Validates a body value against the field type and maps it to its slot
pub fn content_for(field: &FieldDefinition, value: &Value) -> CompileResult<ContentValue> {
    let mismatch = || CompileError::TypeMismatch {
        field: field.name.clone(),
        expected: field.field_type.describe(),
    };

    match (field.field_type, value) {
        (FieldType::Text, Value::String(s)) => Ok(ContentValue::Text(s.clone())),
        (FieldType::Number, Value::Number(n)) => Ok(ContentValue::Number(n.clone())),
        (FieldType::Boolean, Value::Bool(b)) => Ok(ContentValue::Boolean(*b)),
        (FieldType::Array, Value::Array(_)) => Ok(ContentValue::Array(canonical_json(field, value)?)),
        _ => Err(mismatch()),
    }
}

/// Canonical string form of a JSON value (object keys sorted)
pub fn canonical_json(field: &FieldDefinition, value: &Value) -> CompileResult<String> {
    serde_json::to_string(value).map_err(|e| CompileError::MalformedValue {
        field: field.name.clone(),
        reason: e.to_string(),
    })
}
