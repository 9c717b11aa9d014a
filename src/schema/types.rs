//! Record space and field definition types
//!
//! A record space is a user-defined schema whose field list is itself data.
//! Supported field types:
//! - TEXT: UTF-8 string
//! - NUMBER: JSON number
//! - BOOLEAN: true / false
//! - ARRAY: JSON array, stored in canonical string form

use std::collections::HashSet;
use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Key reserved for record identity lookups in queries
pub const RESERVED_ID_KEY: &str = "id";

/// Declared type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    Text,
    Number,
    Boolean,
    Array,
}

impl FieldType {
    /// Returns the type name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            FieldType::Text => "TEXT",
            FieldType::Number => "NUMBER",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Array => "ARRAY",
        }
    }

    /// Storage slot holding values of this type
    pub fn content_slot(&self) -> ContentSlot {
        match self {
            FieldType::Text => ContentSlot::Text,
            FieldType::Number => ContentSlot::Number,
            FieldType::Boolean => ContentSlot::Boolean,
            FieldType::Array => ContentSlot::Array,
        }
    }

    /// Human-readable noun used in validation messages
    pub fn describe(&self) -> &'static str {
        match self {
            FieldType::Text => "a valid string",
            FieldType::Number => "a valid number",
            FieldType::Boolean => "a valid boolean",
            FieldType::Array => "a valid array",
        }
    }

    /// Whether a JSON value has this type (no coercion)
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            FieldType::Text => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
            FieldType::Array => value.is_array(),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name())
    }
}

/// Typed slot of a field content entry in the EAV layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentSlot {
    Text,
    Number,
    Boolean,
    Array,
}

impl ContentSlot {
    /// Storage key of the slot
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentSlot::Text => "textContent",
            ContentSlot::Number => "numberContent",
            ContentSlot::Boolean => "booleanContent",
            ContentSlot::Array => "arrayContent",
        }
    }
}

impl fmt::Display for ContentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single field of a record space
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    /// Stable field identifier
    pub id: Uuid,
    /// Key used in requests
    pub name: String,
    /// Url-safe key used in responses
    pub slug: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    /// Stored as a one-way digest, never returned
    #[serde(default)]
    pub hashed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldDefinition {
    /// Create an optional field; the slug is derived from the name
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            id: Uuid::new_v4(),
            slug: slugify(&name),
            name,
            field_type,
            required: false,
            unique: false,
            hashed: false,
            default_value: None,
            description: None,
        }
    }

    pub fn text(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Text)
    }

    pub fn number(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Number)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Boolean)
    }

    pub fn array(name: impl Into<String>) -> Self {
        Self::new(name, FieldType::Array)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn hashed(mut self) -> Self {
        self.hashed = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default_value = Some(value);
        self
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = slug.into();
        self
    }

    /// Storage slot for this field's values
    pub fn content_slot(&self) -> ContentSlot {
        self.field_type.content_slot()
    }
}

/// A user-defined record schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordSpace {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Ordered field definitions; order is the write order of field contents
    pub fields: Vec<FieldDefinition>,
    /// Field names enabled for text search
    #[serde(default)]
    pub searchable_fields: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecordSpace {
    /// Create a new record space
    pub fn new(name: impl Into<String>, slug: impl Into<String>, fields: Vec<FieldDefinition>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            description: None,
            fields,
            searchable_fields: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Validates the record space structure itself (not a record)
    pub fn validate_structure(&self) -> Result<(), String> {
        if !is_valid_slug(&self.slug) {
            return Err(format!("Record space slug '{}' is not url-safe", self.slug));
        }

        let mut names = HashSet::new();
        let mut slugs = HashSet::new();

        for field in &self.fields {
            if field.name.trim().is_empty() {
                return Err("Field names cannot be empty".into());
            }

            if field.name.eq_ignore_ascii_case(RESERVED_ID_KEY) {
                return Err(format!("Field name '{}' is reserved", field.name));
            }

            if !names.insert(field.name.to_lowercase()) {
                return Err(format!("Duplicate field name '{}'", field.name));
            }

            if !is_valid_slug(&field.slug) {
                return Err(format!("Field slug '{}' is not url-safe", field.slug));
            }

            if !slugs.insert(field.slug.as_str()) {
                return Err(format!(
                    "Duplicate field slug '{}' found, use unique slugs",
                    field.slug
                ));
            }

            if field.hashed && field.field_type != FieldType::Text {
                return Err(format!(
                    "Field '{}' is {} and cannot be hashed; only TEXT fields can",
                    field.name, field.field_type
                ));
            }

            if let Some(default) = &field.default_value {
                if !field.field_type.accepts(default) {
                    return Err(format!(
                        "Default value for field '{}' should be {}",
                        field.name,
                        field.field_type.describe()
                    ));
                }
            }
        }

        Ok(())
    }

    /// Returns the existing fields as `name:TYPE` pairs for diagnostics
    pub fn existing_keys_with_type(&self) -> String {
        existing_keys_with_type(&self.fields)
    }
}

/// Formats field names with their types, comma separated
pub fn existing_keys_with_type(fields: &[FieldDefinition]) -> String {
    fields
        .iter()
        .map(|f| format!("{}:{}", f.name, f.field_type))
        .collect::<Vec<_>>()
        .join(", ")
}

fn slug_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[a-z0-9]+(?:[-_][a-z0-9]+)*$").ok())
        .as_ref()
}

/// Checks whether a slug is url-safe
pub fn is_valid_slug(slug: &str) -> bool {
    slug_pattern().is_some_and(|pattern| pattern.is_match(slug))
}

/// Derives a url-safe slug from a human name
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;

    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    slug
}
