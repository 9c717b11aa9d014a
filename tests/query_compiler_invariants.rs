//! Query Compiler Invariant Tests
//!
//! - Hashed fields never reach the storage filter
//! - `id` is validated and routed to the identity filter
//! - Compilation is deterministic
//! - Empty branches are pruned
//! - Unknown keys fail the whole query

use std::collections::BTreeMap;

use recordspace::compiler::{CompileError, QueryCompiler};
use recordspace::predicate::Conjunction;
use recordspace::schema::{FieldDefinition, RecordSpace};
use serde_json::json;
use uuid::Uuid;

// =============================================================================
// Helper Functions
// =============================================================================

fn people() -> RecordSpace {
    RecordSpace::new(
        "People",
        "people",
        vec![
            FieldDefinition::text("name").required(),
            FieldDefinition::number("age"),
            FieldDefinition::boolean("active"),
            FieldDefinition::array("tags"),
            FieldDefinition::text("ssn").hashed(),
            FieldDefinition::text("pin").hashed(),
        ],
    )
}

fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// =============================================================================
// Hashed Field Tests
// =============================================================================

/// A hashed field is deferred to reconciliation, never filtered in storage.
#[test]
fn test_hashed_field_never_in_storage_filter() {
    let space = people();
    let compiler = QueryCompiler::new(space.id, &space.slug, &space.fields);
    let ssn = &space.fields[4];

    for mode in [Conjunction::And, Conjunction::Or] {
        let compiled = compiler
            .compile(&query(&[("ssn", "123-45-6789"), ("name", "Ada")]), mode)
            .unwrap();

        assert_eq!(compiled.storage_filter.clauses_for(ssn.id).count(), 0);
        assert_eq!(compiled.hashed_field_matchers.len(), 1);
        assert_eq!(compiled.hashed_field_matchers[0].field_slug, "ssn");
        assert_eq!(compiled.hashed_field_matchers[0].value, "123-45-6789");
    }
}

/// Querying only hashed fields prunes every branch.
#[test]
fn test_all_hashed_query_is_fully_pruned() {
    let space = people();
    let compiler = QueryCompiler::new(space.id, &space.slug, &space.fields);

    let compiled = compiler
        .compile(&query(&[("ssn", "1"), ("pin", "2")]), Conjunction::And)
        .unwrap();

    assert!(compiled.storage_filter.and.is_none());
    assert!(compiled.storage_filter.or.is_none());
    assert_eq!(compiled.hashed_field_matchers.len(), 2);

    let filter = serde_json::to_value(&compiled.storage_filter).unwrap();
    assert_eq!(filter, json!({ "recordSpace": space.id }));
}

/// Scenario: schema with a hashed ssn, conjunctive query on it.
#[test]
fn test_hashed_ssn_scenario() {
    let space = RecordSpace::new(
        "Citizens",
        "citizens",
        vec![FieldDefinition::text("ssn").hashed()],
    );
    let compiler = QueryCompiler::new(space.id, &space.slug, &space.fields);

    let compiled = compiler
        .compile(&query(&[("ssn", "123-45-6789")]), Conjunction::And)
        .unwrap();

    assert_eq!(compiled.storage_filter.clause_count(), 0);
    assert_eq!(
        serde_json::to_value(&compiled.hashed_field_matchers).unwrap(),
        json!([{ "fieldSlug": "ssn", "value": "123-45-6789" }])
    );
}

// =============================================================================
// Identity Tests
// =============================================================================

/// Without `id`, the filter carries no `_id`.
#[test]
fn test_no_id_means_no_identity_filter() {
    let space = people();
    let compiler = QueryCompiler::new(space.id, &space.slug, &space.fields);

    let compiled = compiler
        .compile(&query(&[("name", "Ada")]), Conjunction::And)
        .unwrap();
    assert!(compiled.storage_filter.id.is_none());

    let filter = serde_json::to_value(&compiled.storage_filter).unwrap();
    assert!(filter.get("_id").is_none());
}

/// A malformed `id` fails compilation even alongside valid keys.
#[test]
fn test_malformed_id_fails() {
    let space = people();
    let compiler = QueryCompiler::new(space.id, &space.slug, &space.fields);

    for bad in ["", "123", "zzzzzzzz-zzzz-zzzz-zzzz-zzzzzzzzzzzz"] {
        let err = compiler
            .compile(&query(&[("id", bad), ("name", "Ada")]), Conjunction::And)
            .unwrap_err();
        assert_eq!(err, CompileError::InvalidIdentifier(bad.to_string()));
    }
}

/// `id` narrows an across-fields search too.
#[test]
fn test_id_with_across_fields() {
    let space = people();
    let compiler = QueryCompiler::new(space.id, &space.slug, &space.fields);
    let id = Uuid::new_v4();

    let compiled = compiler
        .compile(
            &query(&[("id", id.to_string().as_str()), ("name", "Ada"), ("age", "3")]),
            Conjunction::Or,
        )
        .unwrap();

    assert_eq!(compiled.storage_filter.id, Some(id));
    assert_eq!(compiled.storage_filter.or.as_ref().unwrap().len(), 2);
    assert_eq!(
        compiled.normalized_query.to_value(),
        json!({ "or": [{ "age": "3" }, { "name": "Ada" }] })
    );
}

// =============================================================================
// Determinism Tests
// =============================================================================

/// Compiling the same pair twice yields identical output.
#[test]
fn test_compilation_is_deterministic() {
    let space = people();
    let compiler = QueryCompiler::new(space.id, &space.slug, &space.fields);
    let q = query(&[
        ("tags", "[\"a\",{\"b\":1}]"),
        ("active", "true"),
        ("ssn", "x"),
        ("age", "30"),
    ]);

    for mode in [Conjunction::And, Conjunction::Or] {
        let first = compiler.compile(&q, mode).unwrap();
        let second = compiler.compile(&q, mode).unwrap();
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}

// =============================================================================
// Coercion Tests
// =============================================================================

/// Values are coerced by declared type in the normalized echo.
#[test]
fn test_normalized_query_is_coerced() {
    let space = people();
    let compiler = QueryCompiler::new(space.id, &space.slug, &space.fields);

    let compiled = compiler
        .compile(
            &query(&[("active", "yes"), ("tags", "[1,2]"), ("age", "41")]),
            Conjunction::And,
        )
        .unwrap();

    assert_eq!(
        compiled.normalized_query.to_value(),
        json!({ "active": false, "tags": [1, 2], "age": "41" })
    );
}

/// An unparsable array literal is a malformed value.
#[test]
fn test_bad_array_literal() {
    let space = people();
    let compiler = QueryCompiler::new(space.id, &space.slug, &space.fields);

    let err = compiler
        .compile(&query(&[("tags", "[1,")]), Conjunction::And)
        .unwrap_err();
    assert!(matches!(err, CompileError::MalformedValue { ref field, .. } if field == "tags"));
}

// =============================================================================
// Unknown Field Tests
// =============================================================================

/// Scenario: a key absent from the schema fails compilation.
#[test]
fn test_unknown_field_fails() {
    let space = people();
    let compiler = QueryCompiler::new(space.id, &space.slug, &space.fields);

    let err = compiler
        .compile(&query(&[("unknownField", "x")]), Conjunction::Or)
        .unwrap_err();

    assert_eq!(err.code(), "UNKNOWN_FIELD");
    let message = err.to_string();
    assert!(message.contains("unknownField"));
    assert!(message.contains("people"));
    assert!(message.contains("name:TEXT"));
}
