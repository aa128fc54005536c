//! Integration tests for the template database.
//!
//! Run with: cargo test --package bioscan-storage --test integration_database

use bioscan_core::{RecordId, Template};
use bioscan_storage::{Database, DatabaseConfig, SqliteTemplateStore, TemplateStore};
use chrono::Utc;
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio::sync::Barrier;

#[tokio::test]
async fn test_migration_idempotency() {
    let db = Database::in_memory().await.unwrap();

    db.migrate().await.unwrap();
    db.migrate().await.unwrap();

    let result: (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='biometric_templates'",
    )
    .fetch_one(db.pool())
    .await
    .unwrap();

    assert_eq!(result.0, 1);

    db.close().await;
}

#[tokio::test]
async fn test_file_database_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("bioscan.db");
    let config = DatabaseConfig::new(&path).max_connections(2);

    let db = Database::open(&config).await.unwrap();
    let store = SqliteTemplateStore::new(db.pool().clone());
    let id = store
        .insert(&Template::new("persisted").unwrap(), Utc::now())
        .await
        .unwrap();
    db.close().await;

    let db = Database::open(&config).await.unwrap();
    let store = SqliteTemplateStore::new(db.pool().clone());
    let record = store.get_by_id(id).await.unwrap().unwrap();
    assert_eq!(record.template.as_str(), "persisted");
    db.close().await;
}

#[tokio::test]
async fn test_concurrent_inserts_get_unique_ids() {
    const NUM_CONCURRENT_TASKS: usize = 10;

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("concurrent.db");
    let db = Database::open(&DatabaseConfig::new(&path).max_connections(4))
        .await
        .unwrap();
    let store = Arc::new(SqliteTemplateStore::new(db.pool().clone()));
    let barrier = Arc::new(Barrier::new(NUM_CONCURRENT_TASKS));

    let mut handles = vec![];
    for i in 0..NUM_CONCURRENT_TASKS {
        let store = store.clone();
        let barrier = barrier.clone();
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            let template = Template::new(format!("tpl{i}")).unwrap();
            store.insert(&template, Utc::now()).await.unwrap()
        }));
    }

    let ids: BTreeSet<RecordId> = futures::future::join_all(handles)
        .await
        .into_iter()
        .map(|r| r.unwrap())
        .collect();

    assert_eq!(ids.len(), NUM_CONCURRENT_TASKS);
    assert_eq!(store.list_all().await.unwrap().len(), NUM_CONCURRENT_TASKS);

    db.close().await;
}

#[tokio::test]
async fn test_invalid_stored_template_is_a_decode_error() {
    let db = Database::in_memory().await.unwrap();
    sqlx::query("INSERT INTO biometric_templates (template_base64, created_at) VALUES ('', ?)")
        .bind(Utc::now())
        .execute(db.pool())
        .await
        .unwrap();

    let store = SqliteTemplateStore::new(db.pool().clone());
    let err = store.list_all().await.unwrap_err();
    assert!(err.to_string().contains("template_base64"));
}
