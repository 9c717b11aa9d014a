//! Record Service Flow Tests
//!
//! End-to-end create, find, update and delete over the in-memory store,
//! including hashed-field reconciliation.

use std::collections::BTreeMap;
use std::sync::Arc;

use recordspace::crypto::{Argon2Hasher, HashingConfig};
use recordspace::predicate::Conjunction;
use recordspace::records::{RecordService, ServiceError};
use recordspace::schema::{FieldDefinition, RecordSpace, SchemaLoader};
use recordspace::store::{MemoryRecordStore, RecordStore};
use serde_json::{json, Map, Value};
use tempfile::TempDir;

// =============================================================================
// Helper Functions
// =============================================================================

struct Fixture {
    _temp_dir: TempDir,
    store: Arc<MemoryRecordStore>,
    service: RecordService,
}

fn fixture() -> Fixture {
    let temp_dir = TempDir::new().unwrap();
    let mut loader = SchemaLoader::new(temp_dir.path());
    loader
        .register(RecordSpace::new(
            "Members",
            "members",
            vec![
                FieldDefinition::text("email").required().unique(),
                FieldDefinition::text("city"),
                FieldDefinition::number("age"),
                FieldDefinition::text("pin").hashed(),
            ],
        ))
        .unwrap();

    let store = Arc::new(MemoryRecordStore::new());
    let hasher = Argon2Hasher::new(&HashingConfig::minimal()).unwrap();
    let service = RecordService::new(Arc::new(loader), store.clone(), Arc::new(hasher));

    Fixture {
        _temp_dir: temp_dir,
        store,
        service,
    }
}

fn body(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn query(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

async fn seed(f: &Fixture) {
    for member in [
        json!({ "email": "ada@x.com", "city": "Lagos", "age": 36, "pin": "1234" }),
        json!({ "email": "bo@x.com", "city": "Lagos", "age": 41, "pin": "9999" }),
        json!({ "email": "cy@x.com", "city": "Accra", "age": 36 }),
    ] {
        f.service.create("members", &body(member)).await.unwrap();
    }
}

// =============================================================================
// Create Tests
// =============================================================================

/// Created records are projected without hashed fields
#[tokio::test]
async fn test_create_projects_public_fields() {
    let f = fixture();

    let created = f
        .service
        .create("members", &body(json!({ "email": "ada@x.com", "pin": "1234" })))
        .await
        .unwrap();

    assert_eq!(created.get("email"), Some(&json!("ada@x.com")));
    assert!(created.get("pin").is_none());
    assert_eq!(f.store.len().unwrap(), 1);

    let stored = f.store.get(created.id).await.unwrap().unwrap();
    let digest = stored.fields_content[1].content.as_text().unwrap();
    assert_ne!(digest, "1234");
}

/// Rejected creates leave the store untouched
#[tokio::test]
async fn test_rejected_create_persists_nothing() {
    let f = fixture();

    let err = f
        .service
        .create("members", &body(json!({ "city": "Lagos", "age": "old" })))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 400);
    assert_eq!(err.messages().len(), 2);
    assert!(f.store.is_empty().unwrap());
}

/// A second create with the same unique value conflicts
#[tokio::test]
async fn test_duplicate_create_conflicts() {
    let f = fixture();
    seed(&f).await;

    let err = f
        .service
        .create("members", &body(json!({ "email": "bo@x.com" })))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 409);
    assert_eq!(f.store.len().unwrap(), 3);
}

// =============================================================================
// Find Tests
// =============================================================================

/// Conjunctive search narrows on every field
#[tokio::test]
async fn test_find_conjunctive() {
    let f = fixture();
    seed(&f).await;

    let found = f
        .service
        .find("members", &query(&[("city", "Lagos"), ("age", "36")]), Conjunction::And)
        .await
        .unwrap();

    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("email"), Some(&json!("ada@x.com")));
}

/// Across-field search returns records matching any field
#[tokio::test]
async fn test_find_across_fields() {
    let f = fixture();
    seed(&f).await;

    let found = f
        .service
        .find("members", &query(&[("city", "Accra"), ("age", "41")]), Conjunction::Or)
        .await
        .unwrap();

    let mut emails: Vec<_> = found
        .iter()
        .filter_map(|r| r.get("email").and_then(Value::as_str))
        .collect();
    emails.sort();
    assert_eq!(emails, vec!["bo@x.com", "cy@x.com"]);
}

/// Hashed fields match by verification; wrong values and absent
/// content are excluded
#[tokio::test]
async fn test_find_by_hashed_field() {
    let f = fixture();
    seed(&f).await;

    let found = f
        .service
        .find("members", &query(&[("pin", "1234")]), Conjunction::And)
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get("email"), Some(&json!("ada@x.com")));

    let none = f
        .service
        .find("members", &query(&[("pin", "0000")]), Conjunction::And)
        .await
        .unwrap();
    assert!(none.is_empty());
}

/// find_one returns the first reconciled match or nothing
#[tokio::test]
async fn test_find_one() {
    let f = fixture();
    seed(&f).await;

    let one = f
        .service
        .find_one("members", &query(&[("city", "Lagos"), ("pin", "9999")]), Conjunction::And)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(one.get("email"), Some(&json!("bo@x.com")));

    let missing = f
        .service
        .find_one("members", &query(&[("city", "Nowhere")]), Conjunction::And)
        .await
        .unwrap();
    assert!(missing.is_none());
}

/// Find by id narrows to a single record
#[tokio::test]
async fn test_find_by_id() {
    let f = fixture();
    let created = f
        .service
        .create("members", &body(json!({ "email": "ada@x.com" })))
        .await
        .unwrap();
    let id = created.id.to_string();

    let found = f
        .service
        .find("members", &query(&[("id", id.as_str())]), Conjunction::And)
        .await
        .unwrap();
    assert_eq!(found, vec![created]);
}

/// Unknown keys and unknown record spaces are errors, not empty results
#[tokio::test]
async fn test_find_errors() {
    let f = fixture();

    let err = f
        .service
        .find("members", &query(&[("colour", "red")]), Conjunction::And)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Query(_)));
    assert!(err.messages()[0].contains("email"));

    let err = f
        .service
        .find("ghosts", &query(&[]), Conjunction::And)
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 404);
}

// =============================================================================
// Update Tests
// =============================================================================

/// Partial update keeps untouched fields and may reuse its own unique value
#[tokio::test]
async fn test_partial_update() {
    let f = fixture();
    seed(&f).await;

    let updated = f
        .service
        .update(
            "members",
            &query(&[("email", "ada@x.com")]),
            Conjunction::And,
            &body(json!({ "email": "ada@x.com", "city": "Abuja" })),
        )
        .await
        .unwrap();

    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].get("city"), Some(&json!("Abuja")));
    assert_eq!(updated[0].get("age"), Some(&json!(36)));

    // Hashed content survives the merge
    let still = f
        .service
        .find("members", &query(&[("city", "Abuja"), ("pin", "1234")]), Conjunction::And)
        .await
        .unwrap();
    assert_eq!(still.len(), 1);
}

/// Taking another record's unique value is rejected
#[tokio::test]
async fn test_update_to_duplicate_rejected() {
    let f = fixture();
    seed(&f).await;

    let err = f
        .service
        .update(
            "members",
            &query(&[("email", "cy@x.com")]),
            Conjunction::And,
            &body(json!({ "email": "ada@x.com" })),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 409);
}

/// An empty body leaves matching records unchanged
#[tokio::test]
async fn test_empty_update_unchanged() {
    let f = fixture();
    seed(&f).await;

    let before = f
        .service
        .find("members", &query(&[("email", "cy@x.com")]), Conjunction::And)
        .await
        .unwrap();
    let after = f
        .service
        .update(
            "members",
            &query(&[("email", "cy@x.com")]),
            Conjunction::And,
            &Map::new(),
        )
        .await
        .unwrap();
    assert_eq!(before, after);
}

/// Writing one unique value to several records is rejected before any write
#[tokio::test]
async fn test_unique_value_on_many_records_writes_nothing() {
    let f = fixture();
    seed(&f).await;

    let err = f
        .service
        .update(
            "members",
            &query(&[("city", "Lagos")]),
            Conjunction::And,
            &body(json!({ "email": "same@x.com", "age": 99 })),
        )
        .await
        .unwrap_err();
    assert_eq!(err.status_code(), 409);
    assert_eq!(err.code(), "DUPLICATE_VALUE");

    let taken = f
        .service
        .find("members", &query(&[("email", "same@x.com")]), Conjunction::And)
        .await
        .unwrap();
    assert!(taken.is_empty());

    let untouched = f
        .service
        .find("members", &query(&[("age", "99")]), Conjunction::And)
        .await
        .unwrap();
    assert!(untouched.is_empty());
}

/// Non-unique values may be written to every matched record
#[tokio::test]
async fn test_update_many_records() {
    let f = fixture();
    seed(&f).await;

    let updated = f
        .service
        .update(
            "members",
            &query(&[("city", "Lagos")]),
            Conjunction::And,
            &body(json!({ "age": 50 })),
        )
        .await
        .unwrap();
    assert_eq!(updated.len(), 2);
    assert!(updated.iter().all(|r| r.get("age") == Some(&json!(50))));
}

/// The body is checked even when the query matches nothing
#[tokio::test]
async fn test_update_body_validated_without_targets() {
    let f = fixture();
    seed(&f).await;

    let err = f
        .service
        .update(
            "members",
            &query(&[("city", "Nowhere")]),
            Conjunction::And,
            &body(json!({ "bogus": 1 })),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Command(_)));
    assert_eq!(err.status_code(), 400);
    assert!(err.messages()[0].contains("bogus"));

    let err = f
        .service
        .update(
            "members",
            &query(&[("city", "Nowhere")]),
            Conjunction::And,
            &body(json!({ "age": "old" })),
        )
        .await
        .unwrap_err();
    assert_eq!(err.messages().len(), 1);
    assert!(err.messages()[0].contains("age"));
}

// =============================================================================
// Delete Tests
// =============================================================================

/// Delete removes only reconciled matches
#[tokio::test]
async fn test_delete_by_hashed_field() {
    let f = fixture();
    seed(&f).await;

    let deleted = f
        .service
        .delete("members", &query(&[("city", "Lagos"), ("pin", "9999")]), Conjunction::And)
        .await
        .unwrap();
    assert_eq!(deleted, 1);
    assert_eq!(f.store.len().unwrap(), 2);

    let gone = f
        .service
        .find("members", &query(&[("email", "bo@x.com")]), Conjunction::And)
        .await
        .unwrap();
    assert!(gone.is_empty());
}
