//! Command Compiler Invariant Tests
//!
//! - One missing-field error per omitted required field, zero contents
//! - Type mismatches are reported per field
//! - Duplicate values are fatal and stop before any hashing
//! - Content entries follow schema order and match declared types

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use recordspace::compiler::{CommandCompiler, CommandOptions, CommandRejection, CompileError};
use recordspace::crypto::{Argon2Hasher, HashFuture, Hasher, HashingConfig};
use recordspace::schema::{FieldDefinition, RecordSpace};
use recordspace::store::{
    ContentValue, FieldContent, MemoryRecordStore, RecordStore, StoreUniquenessChecker,
    StoredRecord,
};
use serde_json::{json, Map, Value};

// =============================================================================
// Helper Functions
// =============================================================================

/// Real Argon2 hasher that counts `hash` calls
struct CountingHasher {
    inner: Argon2Hasher,
    hashes: AtomicUsize,
}

impl CountingHasher {
    fn new() -> Self {
        Self {
            inner: Argon2Hasher::new(&HashingConfig::minimal()).unwrap(),
            hashes: AtomicUsize::new(0),
        }
    }

    fn hash_count(&self) -> usize {
        self.hashes.load(Ordering::SeqCst)
    }
}

impl Hasher for CountingHasher {
    fn hash<'a>(&'a self, plaintext: &'a str) -> HashFuture<'a, String> {
        self.hashes.fetch_add(1, Ordering::SeqCst);
        self.inner.hash(plaintext)
    }

    fn verify<'a>(&'a self, plaintext: &'a str, digest: &'a str) -> HashFuture<'a, bool> {
        self.inner.verify(plaintext, digest)
    }
}

struct Harness {
    space: RecordSpace,
    store: Arc<MemoryRecordStore>,
    hasher: Arc<CountingHasher>,
    checker: StoreUniquenessChecker,
}

impl Harness {
    fn new(fields: Vec<FieldDefinition>) -> Self {
        let store = Arc::new(MemoryRecordStore::new());
        let hasher = Arc::new(CountingHasher::new());
        let checker = StoreUniquenessChecker::new(store.clone(), hasher.clone());
        Self {
            space: RecordSpace::new("Accounts", "accounts", fields),
            store,
            hasher,
            checker,
        }
    }

    fn compiler(&self) -> CommandCompiler<'_> {
        CommandCompiler::new(
            self.space.id,
            &self.space.slug,
            &self.space.fields,
            &self.checker,
            self.hasher.as_ref(),
        )
    }

    async fn persist(&self, contents: Vec<FieldContent>) -> StoredRecord {
        self.store
            .insert(StoredRecord::new(self.space.id, contents))
            .await
            .unwrap()
    }
}

fn body(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn email_age_schema() -> Vec<FieldDefinition> {
    vec![
        FieldDefinition::text("email").unique(),
        FieldDefinition::number("age"),
    ]
}

// =============================================================================
// Scenario Tests
// =============================================================================

/// Scenario: unique email supplied, optional age omitted.
#[tokio::test]
async fn test_unique_email_with_age_omitted() {
    let h = Harness::new(email_age_schema());

    let compiled = h
        .compiler()
        .compile(&body(json!({ "email": "a@x.com" })), CommandOptions::create())
        .await
        .unwrap();

    assert_eq!(compiled.record_space, h.space.id);
    assert_eq!(
        compiled.field_contents,
        vec![FieldContent::text(h.space.fields[0].id, "a@x.com")]
    );
}

/// Scenario: age of the wrong type is reported; email is still checked.
#[tokio::test]
async fn test_age_type_mismatch() {
    let h = Harness::new(email_age_schema());

    let rejection = h
        .compiler()
        .compile(
            &body(json!({ "email": "a@x.com", "age": "old" })),
            CommandOptions::create(),
        )
        .await
        .unwrap_err();

    assert_eq!(
        rejection,
        CommandRejection::Rejected(vec![CompileError::TypeMismatch {
            field: "age".into(),
            expected: "a valid number",
        }])
    );

    // Same body with a non-string email reports both fields
    let rejection = h
        .compiler()
        .compile(&body(json!({ "email": 5, "age": "old" })), CommandOptions::create())
        .await
        .unwrap_err();
    assert_eq!(rejection.errors().len(), 2);
}

// =============================================================================
// Omission Tests
// =============================================================================

/// Exactly one missing-field error per omitted required field, no contents.
#[tokio::test]
async fn test_one_error_per_missing_required_field() {
    let h = Harness::new(vec![
        FieldDefinition::text("first").required(),
        FieldDefinition::text("nickname"),
        FieldDefinition::text("last").required(),
        FieldDefinition::number("age").required().with_default(json!(0)),
        FieldDefinition::text("country").required(),
    ]);

    let rejection = h
        .compiler()
        .compile(&body(json!({ "nickname": "ace" })), CommandOptions::create())
        .await
        .unwrap_err();

    let missing: Vec<_> = rejection
        .errors()
        .into_iter()
        .filter_map(|e| match e {
            CompileError::MissingRequiredField { field } => Some(field.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(missing, vec!["first", "last", "country"]);
    assert_eq!(rejection.errors().len(), 3);
    assert_eq!(h.hasher.hash_count(), 0);
}

/// Undeclared body keys are rejected, never passed through.
#[tokio::test]
async fn test_unknown_body_keys_rejected() {
    let h = Harness::new(email_age_schema());

    let rejection = h
        .compiler()
        .compile(
            &body(json!({ "email": "a@x.com", "role": "admin", "Email": "b@x.com" })),
            CommandOptions::create(),
        )
        .await
        .unwrap_err();

    let codes: Vec<_> = rejection.errors().iter().map(|e| e.code()).collect();
    assert_eq!(codes, vec!["UNKNOWN_FIELD", "UNKNOWN_FIELD"]);
}

// =============================================================================
// Uniqueness Tests
// =============================================================================

/// Second create with the same unique value fails before any hashing.
#[tokio::test]
async fn test_duplicate_fails_before_hashing() {
    let h = Harness::new(vec![
        FieldDefinition::text("password").required().hashed(),
        FieldDefinition::text("email").unique(),
    ]);
    let request = body(json!({ "password": "s3cret", "email": "a@x.com" }));

    let first = h
        .compiler()
        .compile(&request, CommandOptions::create())
        .await
        .unwrap();
    assert_eq!(h.hasher.hash_count(), 1);
    let stored = h.persist(first.field_contents).await;

    let rejection = h
        .compiler()
        .compile(&request, CommandOptions::create())
        .await
        .unwrap_err();

    assert!(rejection.is_fatal());
    assert_eq!(rejection.status_code(), 409);
    match rejection {
        CommandRejection::Fatal(CompileError::DuplicateValue {
            field,
            conflicting_record,
        }) => {
            assert_eq!(field, "email");
            assert_eq!(conflicting_record, stored.id);
        }
        other => panic!("unexpected rejection: {other:?}"),
    }
    assert_eq!(h.hasher.hash_count(), 1);
}

/// A duplicate supersedes every accumulated error.
#[tokio::test]
async fn test_duplicate_reported_alone() {
    let h = Harness::new(vec![
        FieldDefinition::text("email").unique(),
        FieldDefinition::text("name").required(),
    ]);
    h.persist(vec![FieldContent::text(h.space.fields[0].id, "a@x.com")])
        .await;

    let rejection = h
        .compiler()
        .compile(
            &body(json!({ "email": "a@x.com", "extra": true })),
            CommandOptions::create(),
        )
        .await
        .unwrap_err();

    assert_eq!(rejection.errors().len(), 1);
    assert_eq!(rejection.errors()[0].code(), "DUPLICATE_VALUE");
}

/// Updating a record with its own unique value is not a duplicate.
#[tokio::test]
async fn test_self_match_exemption() {
    let h = Harness::new(email_age_schema());
    let stored = h
        .persist(vec![FieldContent::text(h.space.fields[0].id, "a@x.com")])
        .await;

    let compiled = h
        .compiler()
        .compile(
            &body(json!({ "email": "a@x.com", "age": 40 })),
            CommandOptions::update(stored.id),
        )
        .await
        .unwrap();
    assert_eq!(compiled.field_contents.len(), 2);
}

/// Hashed unique values are compared by verification, not equality.
#[tokio::test]
async fn test_hashed_unique_value_detected() {
    let h = Harness::new(vec![FieldDefinition::text("token").unique().hashed()]);
    let request = body(json!({ "token": "abc" }));

    let first = h
        .compiler()
        .compile(&request, CommandOptions::create())
        .await
        .unwrap();
    match &first.field_contents[0].content {
        ContentValue::Text(digest) => assert!(digest.starts_with("$argon2id$")),
        other => panic!("unexpected content: {other:?}"),
    }
    h.persist(first.field_contents).await;

    let rejection = h
        .compiler()
        .compile(&request, CommandOptions::create())
        .await
        .unwrap_err();
    assert!(rejection.is_fatal());

    let other = h
        .compiler()
        .compile(&body(json!({ "token": "xyz" })), CommandOptions::create())
        .await;
    assert!(other.is_ok());
}

// =============================================================================
// Content Shape Tests
// =============================================================================

/// Contents follow schema order and use the declared type's slot.
#[tokio::test]
async fn test_contents_in_schema_order_with_typed_slots() {
    let h = Harness::new(vec![
        FieldDefinition::array("tags"),
        FieldDefinition::boolean("active"),
        FieldDefinition::number("age"),
        FieldDefinition::text("name"),
    ]);

    let compiled = h
        .compiler()
        .compile(
            &body(json!({ "name": "Ada", "age": 36.5, "active": true, "tags": ["x", 1] })),
            CommandOptions::create(),
        )
        .await
        .unwrap();

    let fields: Vec<_> = compiled.field_contents.iter().map(|c| c.field).collect();
    let expected: Vec<_> = h.space.fields.iter().map(|f| f.id).collect();
    assert_eq!(fields, expected);

    let contents = serde_json::to_value(&compiled.field_contents).unwrap();
    assert_eq!(contents[0]["arrayContent"], "[\"x\",1]");
    assert_eq!(contents[1]["booleanContent"], true);
    assert_eq!(contents[2]["numberContent"], 36.5);
    assert_eq!(contents[3]["textContent"], "Ada");
}

/// An empty partial update is "nothing to do", not an error.
#[tokio::test]
async fn test_empty_update_is_nothing_to_do() {
    let h = Harness::new(vec![FieldDefinition::text("name").required()]);
    let stored = h.persist(vec![]).await;

    let compiled = h
        .compiler()
        .compile(&Map::new(), CommandOptions::update(stored.id))
        .await
        .unwrap();
    assert!(compiled.is_empty());
}
