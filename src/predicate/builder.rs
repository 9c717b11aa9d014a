//! Predicate construction and pruning
//!
//! Pure transforms: clause assembly under a conjunction, removal of empty
//! branches, and the flat-object to OR-list conversion used by across-field
//! searches.

use serde_json::{Map, Value};

use super::ast::{Conjunction, FieldClause, PredicateTree, StorageFilter};

/// Accumulates clauses under a single conjunction
#[derive(Debug, Clone)]
pub struct PredicateBuilder {
    mode: Conjunction,
    clauses: Vec<FieldClause>,
}

impl PredicateBuilder {
    pub fn new(mode: Conjunction) -> Self {
        Self {
            mode,
            clauses: Vec::new(),
        }
    }

    pub fn push(&mut self, clause: FieldClause) {
        self.clauses.push(clause);
    }

    pub fn with(mut self, clause: FieldClause) -> Self {
        self.push(clause);
        self
    }

    pub fn len(&self) -> usize {
        self.clauses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    pub fn build(self) -> PredicateTree {
        PredicateTree {
            mode: self.mode,
            clauses: self.clauses,
        }
    }
}

/// Drops `and`/`or` branches that ended up with zero clauses.
///
/// An empty conjunction or disjunction means match-all on some engines and
/// match-none on others, so it must never reach storage.
pub fn prune_empty_branches(mut filter: StorageFilter) -> StorageFilter {
    if filter.and.as_ref().is_some_and(Vec::is_empty) {
        filter.and = None;
    }
    if filter.or.as_ref().is_some_and(Vec::is_empty) {
        filter.or = None;
    }
    filter
}

/// Converts `{a: 1, b: 2}` into `[{a: 1}, {b: 2}]`, one single-key object per entry.
pub fn flat_map_to_or_list(map: &Map<String, Value>) -> Vec<Map<String, Value>> {
    map.iter()
        .map(|(key, value)| {
            let mut single = Map::with_capacity(1);
            single.insert(key.clone(), value.clone());
            single
        })
        .collect()
}

/// Wraps an OR-list under its branch key: `{"or": [...]}`
pub fn or_list_value(list: Vec<Map<String, Value>>) -> Value {
    let mut wrapper = Map::with_capacity(1);
    wrapper.insert(
        Conjunction::Or.key().to_string(),
        Value::Array(list.into_iter().map(Value::Object).collect()),
    );
    Value::Object(wrapper)
}
