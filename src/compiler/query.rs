//! Query compiler
//!
//! Turns a flat `{field name -> string}` map into a storage filter over the
//! EAV layout plus the hashed-field matchers deferred to post-fetch.
//!
//! Rules:
//! - `id` is reserved and becomes a direct identity filter
//! - Keys resolve against field names case-insensitively
//! - Hashed fields never reach the storage filter
//! - Empty `and`/`or` branches are pruned before the filter is returned

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::coerce::coerce_query_value;
use super::errors::{CompileError, CompileResult};
use crate::observability::ObservationScope;
use crate::predicate::{
    flat_map_to_or_list, or_list_value, prune_empty_branches, Conjunction, FieldClause,
    PredicateBuilder, StorageFilter,
};
use crate::schema::{existing_keys_with_type, find_field, FieldDefinition, RESERVED_ID_KEY};

/// Plaintext value to verify against a stored digest after fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashedFieldMatcher {
    pub field_slug: String,
    pub value: String,
}

/// Coerced echo of the input query
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedQuery {
    /// `{key: coerced value}` including `id`
    Conjunctive(Map<String, Value>),
    /// One single-key object per queried field
    Disjunctive(Vec<Map<String, Value>>),
}

impl NormalizedQuery {
    pub fn to_value(&self) -> Value {
        match self {
            NormalizedQuery::Conjunctive(map) => Value::Object(map.clone()),
            NormalizedQuery::Disjunctive(list) => or_list_value(list.clone()),
        }
    }
}

impl Serialize for NormalizedQuery {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

/// Output of query compilation
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledQuery {
    pub storage_filter: StorageFilter,
    pub hashed_field_matchers: Vec<HashedFieldMatcher>,
    pub normalized_query: NormalizedQuery,
}

impl CompiledQuery {
    pub fn needs_reconciliation(&self) -> bool {
        !self.hashed_field_matchers.is_empty()
    }
}

/// Compiles queries against one record space's fields
pub struct QueryCompiler<'a> {
    record_space_id: Uuid,
    record_space_slug: &'a str,
    fields: &'a [FieldDefinition],
}

impl<'a> QueryCompiler<'a> {
    pub fn new(record_space_id: Uuid, record_space_slug: &'a str, fields: &'a [FieldDefinition]) -> Self {
        Self {
            record_space_id,
            record_space_slug,
            fields,
        }
    }

    /// Compile a flat query.
    ///
    /// `Conjunction::Or` searches across fields: a record matches when any
    /// non-hashed queried field holds its value.
    pub fn compile(
        &self,
        query: &BTreeMap<String, String>,
        mode: Conjunction,
    ) -> CompileResult<CompiledQuery> {
        let mode_name = mode.to_string();
        let scope = ObservationScope::with_fields(
            "QUERY_COMPILE",
            &[("record_space", self.record_space_slug), ("mode", mode_name.as_str())],
        );

        match self.compile_inner(query, mode) {
            Ok(compiled) => {
                let clauses = compiled.storage_filter.clause_count().to_string();
                let deferred = compiled.hashed_field_matchers.len().to_string();
                scope.complete_with_fields(&[("clauses", clauses.as_str()), ("hashed_matchers", deferred.as_str())]);
                Ok(compiled)
            }
            Err(e) => {
                scope.fail(e.code());
                Err(e)
            }
        }
    }

    fn compile_inner(
        &self,
        query: &BTreeMap<String, String>,
        mode: Conjunction,
    ) -> CompileResult<CompiledQuery> {
        let mut filter = StorageFilter::for_space(self.record_space_id);
        let mut normalized = Map::new();

        if let Some(raw_id) = query.get(RESERVED_ID_KEY) {
            let id = Uuid::parse_str(raw_id.trim())
                .map_err(|_| CompileError::InvalidIdentifier(raw_id.clone()))?;
            filter = filter.with_id(id);
            normalized.insert(RESERVED_ID_KEY.to_string(), Value::String(id.to_string()));
        }

        let mut clauses = PredicateBuilder::new(mode);
        let mut searched = Map::new();
        let mut matchers = Vec::new();

        for (key, raw) in query.iter().filter(|(k, _)| k.as_str() != RESERVED_ID_KEY) {
            let field = find_field(key, self.fields).ok_or_else(|| CompileError::UnknownField {
                key: key.clone(),
                record_space: self.record_space_slug.to_string(),
                existing: existing_keys_with_type(self.fields),
            })?;

            let value = coerce_query_value(field, raw)?;
            searched.insert(key.clone(), value.clone());

            if field.hashed {
                matchers.push(HashedFieldMatcher {
                    field_slug: field.slug.clone(),
                    value: raw.clone(),
                });
                continue;
            }

            clauses.push(FieldClause::eq(field.id, field.content_slot(), value));
        }

        let normalized_query = match mode {
            Conjunction::And => {
                normalized.extend(searched);
                NormalizedQuery::Conjunctive(normalized)
            }
            Conjunction::Or => NormalizedQuery::Disjunctive(flat_map_to_or_list(&searched)),
        };

        Ok(CompiledQuery {
            storage_filter: prune_empty_branches(filter.attach(clauses.build())),
            hashed_field_matchers: matchers,
            normalized_query,
        })
    }
}
