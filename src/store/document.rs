//! Stored record documents in the EAV layout
//!
//! A record is `{ _id, recordSpace, fieldsContent, createdAt, updatedAt }`.
//! Each field content carries the field id plus exactly one typed slot.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use uuid::Uuid;

use crate::schema::ContentSlot;

/// The populated slot of a field content entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ContentValue {
    #[serde(rename = "textContent")]
    Text(String),
    #[serde(rename = "numberContent")]
    Number(Number),
    #[serde(rename = "booleanContent")]
    Boolean(bool),
    /// Canonical JSON string of the array
    #[serde(rename = "arrayContent")]
    Array(String),
}

impl ContentValue {
    pub fn slot(&self) -> ContentSlot {
        match self {
            ContentValue::Text(_) => ContentSlot::Text,
            ContentValue::Number(_) => ContentSlot::Number,
            ContentValue::Boolean(_) => ContentSlot::Boolean,
            ContentValue::Array(_) => ContentSlot::Array,
        }
    }

    /// String form used for uniqueness comparison
    pub fn encoded(&self) -> String {
        match self {
            ContentValue::Text(s) => s.clone(),
            ContentValue::Number(n) => n.to_string(),
            ContentValue::Boolean(b) => b.to_string(),
            ContentValue::Array(s) => s.clone(),
        }
    }

    /// Text payload, if this is a text slot
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Value as it appears in a public projection
    ///
    /// Arrays are parsed back from their canonical string; a corrupt array
    /// string is returned verbatim.
    pub fn to_public_value(&self) -> Value {
        match self {
            ContentValue::Text(s) => Value::String(s.clone()),
            ContentValue::Number(n) => Value::Number(n.clone()),
            ContentValue::Boolean(b) => Value::Bool(*b),
            ContentValue::Array(s) => {
                serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.clone()))
            }
        }
    }
}

/// One (record, field) pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldContent {
    pub field: Uuid,
    #[serde(flatten)]
    pub content: ContentValue,
}

impl FieldContent {
    pub fn new(field: Uuid, content: ContentValue) -> Self {
        Self { field, content }
    }

    pub fn text(field: Uuid, value: impl Into<String>) -> Self {
        Self::new(field, ContentValue::Text(value.into()))
    }
}

/// A persisted record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub record_space: Uuid,
    /// Ordered by schema order at time of write
    pub fields_content: Vec<FieldContent>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl StoredRecord {
    pub fn new(record_space: Uuid, fields_content: Vec<FieldContent>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            record_space,
            fields_content,
            created_at: now,
            updated_at: now,
        }
    }

    /// Content stored for a field, if any
    pub fn content_for(&self, field: Uuid) -> Option<&ContentValue> {
        self.fields_content
            .iter()
            .find(|c| c.field == field)
            .map(|c| &c.content)
    }
}
