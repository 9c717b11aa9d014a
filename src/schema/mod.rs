//! Record space schemas
//!
//! Record spaces are user-defined schemas stored as data. Each space owns an
//! ordered list of field definitions; the compilers resolve request keys
//! against that list at runtime.
//!
//! # Rules
//!
//! - Field names are unique within a space (case-insensitive)
//! - Slugs are url-safe and unique within a space
//! - Only TEXT fields may be hashed
//! - Default values match the declared field type

mod errors;
mod loader;
mod provider;
mod types;

pub use errors::{SchemaError, SchemaErrorCode, SchemaResult, Severity};
pub use loader::SchemaLoader;
pub use provider::{find_field, find_field_by_id, find_field_by_slug, FieldSchemaProvider};
pub use types::{
    existing_keys_with_type, is_valid_slug, slugify, ContentSlot, FieldDefinition, FieldType,
    RecordSpace, RESERVED_ID_KEY,
};
