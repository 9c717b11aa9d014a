//! Schema provider seam and field lookup

use uuid::Uuid;

use super::errors::SchemaResult;
use super::types::{FieldDefinition, RecordSpace};

/// Supplies record space definitions to the compilers (read-only)
pub trait FieldSchemaProvider: Send + Sync {
    /// Ordered field definitions of a record space
    fn get_fields(&self, record_space_id: Uuid) -> SchemaResult<Vec<FieldDefinition>>;

    /// Full record space by slug
    fn record_space(&self, slug: &str) -> SchemaResult<RecordSpace>;
}

/// Resolves a request key against the schema by case-insensitive name.
pub fn find_field<'a>(key: &str, fields: &'a [FieldDefinition]) -> Option<&'a FieldDefinition> {
    fields.iter().find(|f| f.name.eq_ignore_ascii_case(key))
}

/// Resolves a field by its slug (exact match).
pub fn find_field_by_slug<'a>(slug: &str, fields: &'a [FieldDefinition]) -> Option<&'a FieldDefinition> {
    fields.iter().find(|f| f.slug == slug)
}

/// Resolves a field by id.
pub fn find_field_by_id(id: Uuid, fields: &[FieldDefinition]) -> Option<&FieldDefinition> {
    fields.iter().find(|f| f.id == id)
}
