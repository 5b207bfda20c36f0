//! PgCollection against a live PostgreSQL.
//!
//! Ignored by default; run with
//! `DATABASE_URL=postgres://… cargo test --test postgres_test -- --ignored`.

use std::sync::Arc;

use serde_json::{json, Value};
use uuid::Uuid;

use docstore_api::config::Config;
use docstore_api::errors::AppError;
use docstore_api::infra::{Database, Document, DocumentCollection, Filter, PgCollection, Update};

async fn database() -> Option<Database> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let config = Config::new(url, "integration-test-secret-of-32-chars!").unwrap();
    Some(Database::connect(&config).await.unwrap())
}

/// Fresh collection name so runs never see each other's documents.
fn scratch(db: &Database) -> PgCollection {
    PgCollection::new(db.get_connection(), format!("test_{}", Uuid::new_v4().simple()))
}

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => panic!("test document must be an object"),
    }
}

async fn insert_kinds(collection: &PgCollection, kinds: &[&str]) -> Vec<String> {
    let mut ids = Vec::new();
    for kind in kinds {
        let id = Uuid::new_v4().to_string();
        collection
            .insert_one(doc(json!({"_id": id, "kind": kind, "n": ids.len()})))
            .await
            .unwrap();
        ids.push(id);
    }
    ids
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn first_match_is_earliest_created() {
    let Some(db) = database().await else { return };
    let collection = scratch(&db);
    let ids = insert_kinds(&collection, &["x", "y", "x", "x"]).await;

    let filter = Filter::new().eq("kind", "x");
    let first = collection.find_one(&filter).await.unwrap().unwrap();
    assert_eq!(first["_id"], ids[0].as_str());

    let all: Vec<_> = collection
        .find(&filter)
        .await
        .unwrap()
        .into_iter()
        .map(|d| d["_id"].clone())
        .collect();
    assert_eq!(all, vec![json!(ids[0]), json!(ids[2]), json!(ids[3])]);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn update_changes_first_match_only() {
    let Some(db) = database().await else { return };
    let collection = scratch(&db);
    let ids = insert_kinds(&collection, &["x", "x"]).await;

    let updated = collection
        .find_one_and_update(
            &Filter::new().eq("kind", "x"),
            &Update::new().set("profile.city", "Oslo"),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated["_id"], ids[0].as_str());
    assert_eq!(updated["profile"], json!({"city": "Oslo"}));
    let untouched = collection
        .find_one(&Filter::new().eq("_id", ids[1].as_str()))
        .await
        .unwrap()
        .unwrap();
    assert!(untouched.get("profile").is_none());

    let missing = collection
        .find_one_and_update(&Filter::new().eq("kind", "z"), &Update::new().set("a", 1))
        .await
        .unwrap();
    assert_eq!(missing, None);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn concurrent_updates_are_serialized() {
    let Some(db) = database().await else { return };
    let collection = Arc::new(scratch(&db));
    let ids = insert_kinds(&collection, &["counter"]).await;

    let writes: Vec<_> = (0..10)
        .map(|i| {
            let collection = collection.clone();
            tokio::spawn(async move {
                collection
                    .find_one_and_update(
                        &Filter::new().eq("kind", "counter"),
                        &Update::new().set(format!("field{}", i), i),
                    )
                    .await
            })
        })
        .collect();
    for write in writes {
        assert!(matches!(write.await.unwrap(), Ok(Some(_))));
    }

    let stored = collection
        .find_one(&Filter::new().eq("_id", ids[0].as_str()))
        .await
        .unwrap()
        .unwrap();
    assert!((0..10).all(|i| stored.contains_key(&format!("field{}", i))));
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn delete_removes_and_returns_first_match() {
    let Some(db) = database().await else { return };
    let collection = scratch(&db);
    let ids = insert_kinds(&collection, &["x", "x"]).await;
    let filter = Filter::new().eq("kind", "x");

    let deleted = collection.find_one_and_delete(&filter).await.unwrap().unwrap();
    assert_eq!(deleted["_id"], ids[0].as_str());

    let remaining = collection.find(&filter).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0]["_id"], ids[1].as_str());

    collection.find_one_and_delete(&filter).await.unwrap();
    assert_eq!(collection.find_one_and_delete(&filter).await.unwrap(), None);
}

#[tokio::test]
#[ignore = "needs DATABASE_URL"]
async fn user_emails_are_unique() {
    let Some(db) = database().await else { return };
    let users = PgCollection::new(db.get_connection(), "users");
    let email = format!("{}@example.com", Uuid::new_v4().simple());
    let user = |email: &str| doc(json!({"_id": Uuid::new_v4().to_string(), "email": email}));

    let first = users.insert_one(user(&email)).await.unwrap();
    let duplicate = users.insert_one(user(&email)).await;

    assert!(matches!(duplicate, Err(AppError::Conflict(_))));
    users
        .find_one_and_delete(&Filter::new().eq("_id", first["_id"].clone()))
        .await
        .unwrap();
}
