//! Predicate AST and storage filter shape
//!
//! A compiled query reaches storage as
//! `{ recordSpace, _id?, and?: [Clause], or?: [Clause] }` where each clause is
//! `{ field: <field id>, <typed slot>: <value> }` and matches a record when
//! one of its field contents has that field id and an equal value in that slot.

use std::fmt;
use std::str::FromStr;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::schema::ContentSlot;

/// How clauses of a predicate tree combine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
pub enum Conjunction {
    /// Every clause must match (per-record conjunction)
    #[default]
    #[serde(alias = "and", alias = "AND")]
    And,
    /// Any clause may match (value may appear in any of the fields)
    #[serde(alias = "or", alias = "OR")]
    Or,
}

impl Conjunction {
    /// Key of the branch in the storage filter
    pub fn key(&self) -> &'static str {
        match self {
            Conjunction::And => "and",
            Conjunction::Or => "or",
        }
    }

    /// True when the query searches across fields
    pub fn is_across_fields(&self) -> bool {
        matches!(self, Conjunction::Or)
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Conjunction::And => f.write_str("And"),
            Conjunction::Or => f.write_str("Or"),
        }
    }
}

impl FromStr for Conjunction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "and" => Ok(Conjunction::And),
            "or" => Ok(Conjunction::Or),
            other => Err(format!("Unknown param relationship: '{}'", other)),
        }
    }
}

/// Equality on one field's typed storage slot
#[derive(Debug, Clone, PartialEq)]
pub struct FieldClause {
    /// Field definition id
    pub field: Uuid,
    /// Slot compared
    pub slot: ContentSlot,
    /// Value the slot must equal
    pub value: Value,
}

impl FieldClause {
    pub fn eq(field: Uuid, slot: ContentSlot, value: Value) -> Self {
        Self { field, slot, value }
    }
}

impl Serialize for FieldClause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("field", &self.field)?;
        map.serialize_entry(self.slot.as_str(), &self.value)?;
        map.end()
    }
}

/// Clauses combined under one conjunction
#[derive(Debug, Clone, PartialEq)]
pub struct PredicateTree {
    pub mode: Conjunction,
    pub clauses: Vec<FieldClause>,
}

impl PredicateTree {
    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }
}

/// Filter handed to the record store
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StorageFilter {
    /// Record space scope, always present
    #[serde(rename = "recordSpace")]
    pub record_space: Uuid,
    /// Direct identity filter
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub and: Option<Vec<FieldClause>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub or: Option<Vec<FieldClause>>,
}

impl StorageFilter {
    /// Filter matching every record of a record space
    pub fn for_space(record_space: Uuid) -> Self {
        Self {
            record_space,
            id: None,
            and: None,
            or: None,
        }
    }

    /// Narrows the filter to a single record id
    pub fn with_id(mut self, id: Uuid) -> Self {
        self.id = Some(id);
        self
    }

    /// Attaches a predicate tree as the branch named by its conjunction.
    ///
    /// The branch is attached even when empty; callers prune afterwards.
    pub fn attach(mut self, tree: PredicateTree) -> Self {
        match tree.mode {
            Conjunction::And => self.and = Some(tree.clauses),
            Conjunction::Or => self.or = Some(tree.clauses),
        }
        self
    }

    /// True when the filter only scopes to the record space
    pub fn is_space_scan(&self) -> bool {
        self.id.is_none() && self.and.is_none() && self.or.is_none()
    }

    /// Number of clauses across both branches
    pub fn clause_count(&self) -> usize {
        self.and.as_ref().map_or(0, Vec::len) + self.or.as_ref().map_or(0, Vec::len)
    }

    /// Clauses on the given field in either branch
    pub fn clauses_for(&self, field: Uuid) -> impl Iterator<Item = &FieldClause> {
        self.and
            .iter()
            .chain(self.or.iter())
            .flatten()
            .filter(move |c| c.field == field)
    }
}
