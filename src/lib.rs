//! recordspace - schema-driven record query and command compiler
//!
//! Record spaces are user-defined schemas stored as data. This crate compiles
//! flat, untyped requests against those schemas into typed storage filters
//! and field-content lists over an entity-attribute-value record layout,
//! and reconciles hashed-at-rest fields after fetch.

pub mod cli;
pub mod compiler;
pub mod crypto;
pub mod observability;
pub mod predicate;
pub mod reconcile;
pub mod records;
pub mod schema;
pub mod store;
