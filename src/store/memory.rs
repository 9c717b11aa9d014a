//! # In-Memory Record Store
//!
//! Evaluates compiled storage filters against records held in memory.
//!
//! Clause semantics:
//! - A clause matches when some field content has the clause's field id,
//!   the clause's slot, and an equal value
//! - `numberContent` clauses carry strings; they compare numerically
//! - `arrayContent` clauses carry arrays; they compare by canonical JSON

use std::sync::RwLock;

use chrono::Utc;
use serde_json::Value;
use uuid::Uuid;

use super::backend::{RecordStore, StoreFuture};
use super::document::{ContentValue, FieldContent, StoredRecord};
use super::errors::{StoreError, StoreResult};
use crate::predicate::{FieldClause, StorageFilter};

/// Record store backed by a vector in insertion order
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    records: RwLock<Vec<StoredRecord>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records across all record spaces
    pub fn len(&self) -> StoreResult<usize> {
        self.read(|records| records.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len()? == 0)
    }

    fn read<T>(&self, f: impl FnOnce(&Vec<StoredRecord>) -> T) -> StoreResult<T> {
        let records = self
            .records
            .read()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(f(&records))
    }

    fn write<T>(&self, f: impl FnOnce(&mut Vec<StoredRecord>) -> T) -> StoreResult<T> {
        let mut records = self
            .records
            .write()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok(f(&mut records))
    }

    fn find_now(&self, filter: &StorageFilter) -> StoreResult<Vec<StoredRecord>> {
        self.read(|records| {
            records
                .iter()
                .filter(|record| filter_matches(record, filter))
                .cloned()
                .collect()
        })
    }

    fn replace_now(&self, id: Uuid, contents: Vec<FieldContent>) -> StoreResult<StoredRecord> {
        self.write(|records| -> StoreResult<StoredRecord> {
            let record = records
                .iter_mut()
                .find(|r| r.id == id)
                .ok_or(StoreError::RecordNotFound(id))?;
            record.fields_content = contents;
            record.updated_at = Utc::now();
            Ok(record.clone())
        })?
    }
}

impl RecordStore for MemoryRecordStore {
    fn find<'a>(&'a self, filter: &'a StorageFilter) -> StoreFuture<'a, Vec<StoredRecord>> {
        Box::pin(async move { self.find_now(filter) })
    }

    fn get(&self, id: Uuid) -> StoreFuture<'_, Option<StoredRecord>> {
        Box::pin(async move { self.read(|records| records.iter().find(|r| r.id == id).cloned()) })
    }

    fn insert(&self, record: StoredRecord) -> StoreFuture<'_, StoredRecord> {
        Box::pin(async move {
            self.write(|records| {
                records.push(record.clone());
                record
            })
        })
    }

    fn replace_contents(
        &self,
        id: Uuid,
        contents: Vec<FieldContent>,
    ) -> StoreFuture<'_, StoredRecord> {
        Box::pin(async move { self.replace_now(id, contents) })
    }

    fn delete(&self, id: Uuid) -> StoreFuture<'_, bool> {
        Box::pin(async move {
            self.write(|records| {
                let before = records.len();
                records.retain(|r| r.id != id);
                records.len() != before
            })
        })
    }

    fn field_contents(&self, field: Uuid) -> StoreFuture<'_, Vec<(Uuid, ContentValue)>> {
        Box::pin(async move {
            self.read(|records| {
                records
                    .iter()
                    .filter_map(|r| r.content_for(field).map(|c| (r.id, c.clone())))
                    .collect()
            })
        })
    }
}

/// Evaluates a compiled filter against one record
pub fn filter_matches(record: &StoredRecord, filter: &StorageFilter) -> bool {
    if record.record_space != filter.record_space {
        return false;
    }
    if filter.id.is_some_and(|id| id != record.id) {
        return false;
    }
    if let Some(and) = &filter.and {
        if !and.iter().all(|clause| clause_matches(record, clause)) {
            return false;
        }
    }
    if let Some(or) = &filter.or {
        if !or.iter().any(|clause| clause_matches(record, clause)) {
            return false;
        }
    }
    true
}

fn clause_matches(record: &StoredRecord, clause: &FieldClause) -> bool {
    record.fields_content.iter().any(|content| {
        content.field == clause.field
            && content.content.slot() == clause.slot
            && slot_equals(&content.content, &clause.value)
    })
}

fn slot_equals(content: &ContentValue, expected: &Value) -> bool {
    match (content, expected) {
        (ContentValue::Text(stored), Value::String(wanted)) => stored == wanted,
        (ContentValue::Number(stored), Value::String(wanted)) => wanted
            .trim()
            .parse::<f64>()
            .ok()
            .zip(stored.as_f64())
            .is_some_and(|(a, b)| a == b),
        (ContentValue::Number(stored), Value::Number(wanted)) => {
            stored.as_f64().is_some() && stored.as_f64() == wanted.as_f64()
        }
        (ContentValue::Boolean(stored), Value::Bool(wanted)) => stored == wanted,
        (ContentValue::Array(stored), Value::Array(_)) => {
            serde_json::to_string(expected).is_ok_and(|wanted| &wanted == stored)
        }
        (ContentValue::Array(stored), Value::String(wanted)) => stored == wanted,
        _ => false,
    }
}
