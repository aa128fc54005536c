#![allow(async_fn_in_trait)]

use crate::error::StorageResult;
use crate::models::BiometricRecord;
use bioscan_core::{RecordId, Template};
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use tracing::{debug, info};

/// Durable keyed storage of captured templates.
///
/// Every mutation is committed before the call returns, so a record is
/// visible to readers only once it is durable.
pub trait TemplateStore: Send + Sync {
    /// Persist a template and return its newly assigned id
    async fn insert(&self, template: &Template, created_at: DateTime<Utc>)
    -> StorageResult<RecordId>;

    /// All records, ordered by id
    async fn list_all(&self) -> StorageResult<Vec<BiometricRecord>>;

    /// Find a record by id
    async fn get_by_id(&self, id: RecordId) -> StorageResult<Option<BiometricRecord>>;

    /// Remove every record, returning how many were removed
    async fn delete_all(&self) -> StorageResult<u64>;

    /// Remove one record; `false` if it did not exist
    async fn delete_by_id(&self, id: RecordId) -> StorageResult<bool>;
}

/// SQLite implementation of TemplateStore
#[derive(Debug, Clone)]
pub struct SqliteTemplateStore {
    pool: SqlitePool,
}

impl SqliteTemplateStore {
    /// Create a new SQLite template store
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

impl TemplateStore for SqliteTemplateStore {
    async fn insert(
        &self,
        template: &Template,
        created_at: DateTime<Utc>,
    ) -> StorageResult<RecordId> {
        let result = sqlx::query(
            r#"
            INSERT INTO biometric_templates (template_base64, created_at)
            VALUES (?, ?)
            "#,
        )
        .bind(template.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let id = RecordId::new(result.last_insert_rowid());
        info!(id = id.as_i64(), "Biometric record stored");
        Ok(id)
    }

    async fn list_all(&self) -> StorageResult<Vec<BiometricRecord>> {
        let records = sqlx::query_as::<_, BiometricRecord>(
            r#"
            SELECT id, template_base64, created_at
            FROM biometric_templates
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = records.len(), "Listed biometric records");
        Ok(records)
    }

    async fn get_by_id(&self, id: RecordId) -> StorageResult<Option<BiometricRecord>> {
        let record = sqlx::query_as::<_, BiometricRecord>(
            r#"
            SELECT id, template_base64, created_at
            FROM biometric_templates
            WHERE id = ?
            "#,
        )
        .bind(id.as_i64())
        .fetch_optional(&self.pool)
        .await?;

        Ok(record)
    }

    async fn delete_all(&self) -> StorageResult<u64> {
        let result = sqlx::query("DELETE FROM biometric_templates")
            .execute(&self.pool)
            .await?;

        info!(removed = result.rows_affected(), "All biometric records deleted");
        Ok(result.rows_affected())
    }

    async fn delete_by_id(&self, id: RecordId) -> StorageResult<bool> {
        let result = sqlx::query("DELETE FROM biometric_templates WHERE id = ?")
            .bind(id.as_i64())
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        if removed {
            info!(id = id.as_i64(), "Biometric record deleted");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::Database;

    async fn store() -> SqliteTemplateStore {
        let db = Database::in_memory().await.unwrap();
        SqliteTemplateStore::new(db.pool().clone())
    }

    fn template(encoded: &str) -> Template {
        Template::new(encoded).unwrap()
    }

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = store().await;

        let first = store.insert(&template("aaa"), Utc::now()).await.unwrap();
        let second = store.insert(&template("bbb"), Utc::now()).await.unwrap();

        assert_eq!(first, RecordId::new(1));
        assert_eq!(second, RecordId::new(2));
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let store = store().await;
        let id = store.insert(&template("abc123"), Utc::now()).await.unwrap();

        let record = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.id, id);
        assert_eq!(record.template.as_str(), "abc123");

        assert!(store.get_by_id(RecordId::new(99)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_all_is_ordered_by_id() {
        let store = store().await;
        for encoded in ["c", "a", "b"] {
            store.insert(&template(encoded), Utc::now()).await.unwrap();
        }

        let ids: Vec<i64> = store
            .list_all()
            .await
            .unwrap()
            .iter()
            .map(|r| r.id.as_i64())
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_delete_by_id() {
        let store = store().await;
        let keep = store.insert(&template("keep"), Utc::now()).await.unwrap();
        let gone = store.insert(&template("gone"), Utc::now()).await.unwrap();

        assert!(store.delete_by_id(gone).await.unwrap());
        assert!(!store.delete_by_id(gone).await.unwrap());

        let remaining = store.list_all().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, keep);
    }

    #[tokio::test]
    async fn test_delete_all_then_ids_keep_growing() {
        let store = store().await;
        store.insert(&template("one"), Utc::now()).await.unwrap();
        store.insert(&template("two"), Utc::now()).await.unwrap();

        assert_eq!(store.delete_all().await.unwrap(), 2);
        assert!(store.list_all().await.unwrap().is_empty());

        let next = store.insert(&template("three"), Utc::now()).await.unwrap();
        assert_eq!(next, RecordId::new(3));
    }

    #[tokio::test]
    async fn test_created_at_round_trips() {
        let store = store().await;
        let now = Utc::now();
        let id = store.insert(&template("ts"), now).await.unwrap();

        let record = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.created_at, now);
    }
}
