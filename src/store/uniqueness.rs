//! # Uniqueness Checker
//!
//! Answers "does another record already hold this value for this field".
//! Hashed fields are stored as salted digests, so their candidates are
//! verified against every stored digest instead of compared for equality.

use std::sync::Arc;

use uuid::Uuid;

use super::backend::{RecordStore, StoreFuture};
use super::document::ContentValue;
use super::errors::StoreError;
use crate::crypto::Hasher;
use crate::schema::FieldDefinition;

/// Conflict lookup used by the command compiler
pub trait UniquenessChecker: Send + Sync {
    /// Id of a record other than `exclude` holding `candidate` for `field`
    ///
    /// For hashed fields `candidate` is the plaintext value.
    fn find_conflict<'a>(
        &'a self,
        field: &'a FieldDefinition,
        candidate: &'a ContentValue,
        exclude: Option<Uuid>,
    ) -> StoreFuture<'a, Option<Uuid>>;
}

/// Uniqueness checker over a record store
pub struct StoreUniquenessChecker {
    store: Arc<dyn RecordStore>,
    hasher: Arc<dyn Hasher>,
}

impl StoreUniquenessChecker {
    pub fn new(store: Arc<dyn RecordStore>, hasher: Arc<dyn Hasher>) -> Self {
        Self { store, hasher }
    }

    async fn matches_stored(
        &self,
        field: &FieldDefinition,
        stored: &ContentValue,
        candidate: &ContentValue,
    ) -> Result<bool, StoreError> {
        if !field.hashed {
            return Ok(same_value(stored, candidate));
        }
        match (stored.as_text(), candidate.as_text()) {
            (Some(digest), Some(plaintext)) => self
                .hasher
                .verify(plaintext, digest)
                .await
                .map_err(|e| StoreError::ConstraintCheck(e.to_string())),
            _ => Ok(false),
        }
    }
}

impl UniquenessChecker for StoreUniquenessChecker {
    fn find_conflict<'a>(
        &'a self,
        field: &'a FieldDefinition,
        candidate: &'a ContentValue,
        exclude: Option<Uuid>,
    ) -> StoreFuture<'a, Option<Uuid>> {
        Box::pin(async move {
            let stored = self.store.field_contents(field.id).await?;
            for (record_id, content) in stored {
                if exclude == Some(record_id) {
                    continue;
                }
                if self.matches_stored(field, &content, candidate).await? {
                    return Ok(Some(record_id));
                }
            }
            Ok(None)
        })
    }
}

fn same_value(stored: &ContentValue, candidate: &ContentValue) -> bool {
    match (stored, candidate) {
        (ContentValue::Number(a), ContentValue::Number(b)) => {
            a.as_f64().is_some() && a.as_f64() == b.as_f64()
        }
        _ => stored.slot() == candidate.slot() && stored.encoded() == candidate.encoded(),
    }
}
