//! Postgres record store integration tests
//!
//! Requires a running PostgreSQL database.
//! Run with: DATABASE_URL="postgresql:///intent_router_test" cargo test --features database --test pg_store_integration -- --ignored

#![cfg(feature = "database")]

use serde_json::json;

use intent_router::database::{PgRecordStore, PgStoreConfig};
use intent_router::{FieldMap, FilterOp, Predicate, RecordStore};

async fn store() -> PgRecordStore {
    let config = PgStoreConfig {
        database_url: std::env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
        ..PgStoreConfig::default()
    };
    let store = PgRecordStore::connect(&config).await.unwrap();
    store.ensure_schema().await.unwrap();
    store
}

fn fields(value: serde_json::Value) -> FieldMap {
    value.as_object().cloned().unwrap()
}

/// Unique tag so tests do not see each other's rows
fn tag(prefix: &str) -> String {
    format!("{}_{}s", prefix, uuid::Uuid::new_v4().simple())
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn test_create_read_count() {
    let store = store().await;
    let products = tag("product");

    for (name, price) in [("Mouse", 25), ("Monitor", 300), ("Desk", 100)] {
        store
            .create(&products, fields(json!({"name": name, "price": price})))
            .await
            .unwrap();
    }

    let expensive = store
        .read(
            Some(&products),
            &[Predicate::new("price", FilterOp::Gte, json!(100))],
            10,
        )
        .await
        .unwrap();
    let names: Vec<_> = expensive
        .iter()
        .filter_map(|r| r.get("name").and_then(|v| v.as_str()))
        .collect();
    assert_eq!(names, vec!["Monitor", "Desk"]);

    let cheap = store
        .count(
            Some(&products),
            &[Predicate::new("price", FilterOp::Lte, json!(30))],
        )
        .await
        .unwrap();
    assert_eq!(cheap, 1);
}

#[tokio::test]
#[ignore] // requires DATABASE_URL
async fn test_update_and_delete_first_match() {
    let store = store().await;
    let employees = tag("employee");

    let first = store
        .create(&employees, fields(json!({"name": "Ann", "team": "red"})))
        .await
        .unwrap();
    store
        .create(&employees, fields(json!({"name": "Bob", "team": "red"})))
        .await
        .unwrap();

    let updated = store
        .update(
            Some(&employees),
            &[Predicate::eq("team", json!("red"))],
            fields(json!({"team": "blue", "entity": "ignored"})),
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.id, first.id);
    assert_eq!(updated.entity, employees);
    assert_eq!(updated.get("team"), Some(&json!("blue")));

    let deleted = store
        .delete(Some(&employees), &[Predicate::eq("name", json!("Bob"))])
        .await
        .unwrap();
    assert!(deleted.is_some());
    assert_eq!(store.count(Some(&employees), &[]).await.unwrap(), 1);

    let missing = store
        .delete(Some(&employees), &[Predicate::eq("name", json!("Zed"))])
        .await
        .unwrap();
    assert!(missing.is_none());
}
