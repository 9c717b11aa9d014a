//! Predicate Builder for recordspace
//!
//! Builds and prunes the boolean predicate trees a compiled query hands to
//! storage. Exactly one shape is supported: a flat list of equality clauses
//! joined by AND or OR, optionally narrowed by a record id.

mod ast;
mod builder;

pub use ast::{Conjunction, FieldClause, PredicateTree, StorageFilter};
pub use builder::{flat_map_to_or_list, or_list_value, prune_empty_branches, PredicateBuilder};
