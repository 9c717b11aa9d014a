//! Public projection of stored records

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::schema::{find_field_by_id, FieldDefinition};
use crate::store::StoredRecord;

/// A record as returned to callers: non-hashed fields keyed by slug
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicRecord {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl PublicRecord {
    pub fn get(&self, slug: &str) -> Option<&Value> {
        self.fields.get(slug)
    }
}

/// Projects a stored record; hashed fields and fields no longer in the
/// schema are left out.
pub fn project(record: &StoredRecord, fields: &[FieldDefinition]) -> PublicRecord {
    let mut projected = Map::new();
    for content in &record.fields_content {
        let Some(field) = find_field_by_id(content.field, fields) else {
            continue;
        };
        if field.hashed {
            continue;
        }
        projected.insert(field.slug.clone(), content.content.to_public_value());
    }

    PublicRecord {
        id: record.id,
        created_at: record.created_at,
        updated_at: record.updated_at,
        fields: projected,
    }
}
