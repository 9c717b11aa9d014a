//! # Hash Reconciler
//!
//! Storage cannot compare plaintext against salted digests, so a query on a
//! hashed field returns a superset of the answer. This step is the real
//! filter: every deferred matcher must verify against the record's digest.
//!
//! A failed verification is a normal "no match", never an error.

use super::projection::{project, PublicRecord};
use crate::compiler::HashedFieldMatcher;
use crate::crypto::{CryptoResult, Hasher};
use crate::observability::Logger;
use crate::schema::{find_field_by_slug, FieldDefinition};
use crate::store::StoredRecord;

/// Verifies deferred hashed-field matchers against fetched candidates
pub struct HashReconciler<'a> {
    hasher: &'a dyn Hasher,
}

impl<'a> HashReconciler<'a> {
    pub fn new(hasher: &'a dyn Hasher) -> Self {
        Self { hasher }
    }

    /// Public projection of `record`, or `None` when a matcher does not verify.
    ///
    /// A record holding no content for a matched field does not match.
    pub async fn reconcile(
        &self,
        record: &StoredRecord,
        fields: &[FieldDefinition],
        matchers: &[HashedFieldMatcher],
    ) -> CryptoResult<Option<PublicRecord>> {
        for matcher in matchers {
            if !self.verifies(record, fields, matcher).await? {
                Logger::trace(
                    "HASH_RECONCILE_REJECTED",
                    &[
                        ("field", matcher.field_slug.as_str()),
                        ("record", record.id.to_string().as_str()),
                    ],
                );
                return Ok(None);
            }
        }
        Ok(Some(project(record, fields)))
    }

    /// Reconciles candidates in order, keeping the ones that match
    pub async fn reconcile_all(
        &self,
        records: &[StoredRecord],
        fields: &[FieldDefinition],
        matchers: &[HashedFieldMatcher],
    ) -> CryptoResult<Vec<PublicRecord>> {
        let mut matched = Vec::with_capacity(records.len());
        for record in records {
            if let Some(public) = self.reconcile(record, fields, matchers).await? {
                matched.push(public);
            }
        }
        Ok(matched)
    }

    async fn verifies(
        &self,
        record: &StoredRecord,
        fields: &[FieldDefinition],
        matcher: &HashedFieldMatcher,
    ) -> CryptoResult<bool> {
        let digest = find_field_by_slug(&matcher.field_slug, fields)
            .and_then(|field| record.content_for(field.id))
            .and_then(|content| content.as_text());

        match digest {
            Some(digest) => self.hasher.verify(&matcher.value, digest).await,
            None => Ok(false),
        }
    }
}
