//! # Record Store Trait

use std::future::Future;
use std::pin::Pin;

use uuid::Uuid;

use super::document::{ContentValue, FieldContent, StoredRecord};
use super::errors::StoreResult;
use crate::predicate::StorageFilter;

/// Boxed future returned by store operations
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = StoreResult<T>> + Send + 'a>>;

/// Schema-less document store holding EAV records
pub trait RecordStore: Send + Sync {
    /// Records matching a compiled filter, in insertion order
    fn find<'a>(&'a self, filter: &'a StorageFilter) -> StoreFuture<'a, Vec<StoredRecord>>;

    /// Record by id
    fn get(&self, id: Uuid) -> StoreFuture<'_, Option<StoredRecord>>;

    /// Persist a new record
    fn insert(&self, record: StoredRecord) -> StoreFuture<'_, StoredRecord>;

    /// Replace the whole content list of a record and bump `updatedAt`
    fn replace_contents(
        &self,
        id: Uuid,
        contents: Vec<FieldContent>,
    ) -> StoreFuture<'_, StoredRecord>;

    /// Delete a record, returning whether it existed
    fn delete(&self, id: Uuid) -> StoreFuture<'_, bool>;

    /// Every stored value of a field as `(record id, content)` pairs
    fn field_contents(&self, field: Uuid) -> StoreFuture<'_, Vec<(Uuid, ContentValue)>>;
}
