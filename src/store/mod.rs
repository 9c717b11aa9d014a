//! Record store for recordspace
//!
//! Records are stored in an entity-attribute-value layout: each record owns
//! an ordered list of `(field id, typed value)` entries. The store is
//! schema-less; the command compiler is the only enforcer of field types.

mod backend;
mod document;
mod errors;
mod memory;
mod uniqueness;

pub use backend::{RecordStore, StoreFuture};
pub use document::{ContentValue, FieldContent, StoredRecord};
pub use errors::{StoreError, StoreResult};
pub use memory::{filter_matches, MemoryRecordStore};
pub use uniqueness::{StoreUniquenessChecker, UniquenessChecker};
