use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::sqlite::{Sqlite, SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{QueryBuilder, Row};
use std::path::Path;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::infrastructure::cache::Cache;
use crate::infrastructure::document_store::{
    document_body, merge_partial, Document, DocumentCheck, DocumentQuery, DocumentStore, FilterOp,
};
use crate::models::Collection;

const SELECT_COLUMNS: &str = "SELECT id, data, created_at, updated_at FROM documents";

type CacheKey = (Collection, String);

/// SQLite-backed document store. Documents are JSON text queried with `json_extract`.
pub struct SqliteDocumentStore {
    pool: SqlitePool,
    cache: Arc<Mutex<Cache<CacheKey, Document>>>,
    /// Bumped under the cache lock on every invalidation. A read only fills
    /// the cache if no invalidation happened while it was in flight.
    write_epoch: AtomicU64,
}

impl SqliteDocumentStore {
    pub async fn connect(database_url: &str, cache_capacity: usize) -> AppResult<Self> {
        let in_memory = database_url.contains(":memory:");
        if !in_memory {
            ensure_parent_dir(database_url)?;
        }

        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| {
                AppError::DatabaseError(format!("Invalid database URL {}: {}", database_url, e))
            })?
            .create_if_missing(true);

        // An in-memory database lives only as long as its single connection.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(5)
        };

        let pool = pool_options.connect_with(options).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to connect to {}: {}", database_url, e))
        })?;

        let store = Self {
            pool,
            cache: Arc::new(Mutex::new(Cache::new(cache_capacity))),
            write_epoch: AtomicU64::new(0),
        };
        store.initialize().await?;
        Ok(store)
    }

    pub async fn new_in_memory(cache_capacity: usize) -> AppResult<Self> {
        Self::connect("sqlite::memory:", cache_capacity).await
    }

    /// Create the documents table if it does not exist yet.
    pub async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS documents (
                collection TEXT NOT NULL,
                id TEXT NOT NULL,
                data TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                deleted_at INTEGER,
                PRIMARY KEY (collection, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create documents table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_documents_live ON documents(collection, deleted_at, created_at)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to create documents index: {}", e)))?;

        Ok(())
    }

    async fn fetch_live(&self, collection: Collection, id: &str) -> AppResult<Option<Document>> {
        let row = sqlx::query(&format!(
            "{} WHERE collection = ? AND id = ? AND deleted_at IS NULL",
            SELECT_COLUMNS
        ))
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to get {}/{}: {}", collection, id, e))
        })?;

        row.map(|row| row_to_document(collection, &row)).transpose()
    }

    async fn invalidate(&self, collection: Collection, id: &str) {
        let mut cache = self.cache.lock().await;
        self.write_epoch.fetch_add(1, Ordering::SeqCst);
        cache.remove(&(collection, id.to_string()));
    }

    fn current_epoch(&self) -> u64 {
        self.write_epoch.load(Ordering::SeqCst)
    }

    /// Cache `doc` unless something was invalidated since `epoch` was read.
    async fn fill_cache(&self, key: CacheKey, doc: Document, epoch: u64) {
        let mut cache = self.cache.lock().await;
        if self.current_epoch() == epoch {
            cache.insert(key, doc);
        }
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get(&self, collection: Collection, id: &str) -> AppResult<Option<Document>> {
        let key = (collection, id.to_string());
        if let Some(doc) = self.cache.lock().await.get(&key) {
            return Ok(Some(doc));
        }

        let epoch = self.current_epoch();
        let doc = self.fetch_live(collection, id).await?;
        if let Some(doc) = &doc {
            self.fill_cache(key, doc.clone(), epoch).await;
        }
        Ok(doc)
    }

    async fn list(&self, collection: Collection) -> AppResult<Vec<Document>> {
        self.query(collection, &DocumentQuery::new()).await
    }

    async fn query(&self, collection: Collection, query: &DocumentQuery) -> AppResult<Vec<Document>> {
        query.validate()?;

        let mut qb = QueryBuilder::<Sqlite>::new(SELECT_COLUMNS);
        qb.push(" WHERE collection = ");
        qb.push_bind(collection.as_str());
        qb.push(" AND deleted_at IS NULL");

        for filter in &query.filters {
            qb.push(" AND ");
            push_field(&mut qb, &filter.field);
            match &filter.value {
                Value::Null => {
                    qb.push(if filter.op == FilterOp::Eq {
                        " IS NULL"
                    } else {
                        " IS NOT NULL"
                    });
                }
                value => {
                    qb.push(" ");
                    qb.push(filter.op.as_sql());
                    qb.push(" ");
                    push_value(&mut qb, value)?;
                }
            }
        }

        match &query.order_by {
            Some((field, direction)) => {
                qb.push(" ORDER BY ");
                push_field(&mut qb, field);
                qb.push(" ");
                qb.push(direction.as_sql());
                qb.push(", id ASC");
            }
            None => {
                qb.push(" ORDER BY created_at ASC, id ASC");
            }
        }

        if let Some(limit) = query.limit {
            qb.push(" LIMIT ");
            qb.push_bind(i64::from(limit));
        }

        let rows = qb.build().fetch_all(&self.pool).await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to query {}: {}", collection, e))
        })?;

        rows.iter()
            .map(|row| row_to_document(collection, row))
            .collect()
    }

    async fn add(&self, collection: Collection, data: Value) -> AppResult<Document> {
        let data = document_body(data)?;
        let id = Uuid::new_v4().simple().to_string();
        let now = now_millis();

        sqlx::query(
            "INSERT INTO documents (collection, id, data, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(collection.as_str())
        .bind(&id)
        .bind(serde_json::to_string(&data)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to add document to {}: {}", collection, e))
        })?;

        debug!("Added {}/{}", collection, id);
        let created_at = millis_to_datetime(now)?;
        Ok(Document {
            id,
            collection,
            data,
            created_at,
            updated_at: created_at,
        })
    }

    async fn set(&self, collection: Collection, id: &str, data: Value) -> AppResult<Document> {
        let data = document_body(data)?;
        let now = now_millis();

        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, created_at, updated_at, deleted_at)
            VALUES (?, ?, ?, ?, ?, NULL)
            ON CONFLICT(collection, id) DO UPDATE SET
                data = excluded.data,
                updated_at = excluded.updated_at,
                deleted_at = NULL
            "#,
        )
        .bind(collection.as_str())
        .bind(id)
        .bind(serde_json::to_string(&data)?)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to set {}/{}: {}", collection, id, e)))?;

        self.invalidate(collection, id).await;
        debug!("Set {}/{}", collection, id);
        self.fetch_live(collection, id).await?.ok_or_else(|| {
            AppError::Internal(format!("{}/{} missing right after write", collection, id))
        })
    }

    async fn update_checked(
        &self,
        collection: Collection,
        id: &str,
        partial: Value,
        check: &DocumentCheck,
    ) -> AppResult<Document> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to begin transaction: {}", e))
        })?;

        let row = sqlx::query(&format!(
            "{} WHERE collection = ? AND id = ? AND deleted_at IS NULL",
            SELECT_COLUMNS
        ))
        .bind(collection.as_str())
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to load {}/{}: {}", collection, id, e))
        })?
        .ok_or_else(|| AppError::NotFound(format!("{}/{} not found", collection, id)))?;

        let mut doc = row_to_document(collection, &row)?;
        merge_partial(&mut doc.data, partial)?;
        // an early return drops the transaction, rolling it back
        check(&doc.data)?;
        let now = now_millis();

        sqlx::query("UPDATE documents SET data = ?, updated_at = ? WHERE collection = ? AND id = ?")
            .bind(serde_json::to_string(&doc.data)?)
            .bind(now)
            .bind(collection.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                AppError::DatabaseError(format!("Failed to update {}/{}: {}", collection, id, e))
            })?;

        tx.commit().await.map_err(|e| {
            AppError::DatabaseError(format!("Failed to commit transaction: {}", e))
        })?;

        self.invalidate(collection, id).await;
        debug!("Updated {}/{}", collection, id);
        doc.updated_at = millis_to_datetime(now)?;
        Ok(doc)
    }

    async fn delete(&self, collection: Collection, id: &str) -> AppResult<()> {
        let result = sqlx::query(
            "UPDATE documents SET deleted_at = ? WHERE collection = ? AND id = ? AND deleted_at IS NULL",
        )
        .bind(now_millis())
        .bind(collection.as_str())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(format!("Failed to delete {}/{}: {}", collection, id, e))
        })?;

        self.invalidate(collection, id).await;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("{}/{} not found", collection, id)));
        }
        debug!("Deleted {}/{}", collection, id);
        Ok(())
    }

    async fn count(&self, collection: Collection) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents WHERE collection = ? AND deleted_at IS NULL",
        )
        .bind(collection.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(format!("Failed to count {}: {}", collection, e)))?;
        Ok(count.max(0) as u64)
    }
}

fn push_field(qb: &mut QueryBuilder<'_, Sqlite>, field: &str) {
    match field {
        "id" => {
            qb.push("id");
        }
        "createdAt" => {
            qb.push("created_at");
        }
        "updatedAt" => {
            qb.push("updated_at");
        }
        path => {
            qb.push("json_extract(data, ");
            qb.push_bind(format!("$.{}", path));
            qb.push(")");
        }
    }
}

fn push_value(qb: &mut QueryBuilder<'_, Sqlite>, value: &Value) -> AppResult<()> {
    match value {
        // json_extract yields 1/0 for JSON booleans
        Value::Bool(b) => {
            qb.push_bind(i64::from(*b));
        }
        Value::Number(n) => match n.as_i64() {
            Some(i) => {
                qb.push_bind(i);
            }
            None => {
                qb.push_bind(n.as_f64().unwrap_or_default());
            }
        },
        Value::String(s) => {
            qb.push_bind(s.clone());
        }
        other => {
            return Err(AppError::Validation(format!(
                "cannot compare against {}",
                other
            )))
        }
    }
    Ok(())
}

fn row_to_document(collection: Collection, row: &SqliteRow) -> AppResult<Document> {
    let data: String = row.try_get("data")?;
    Ok(Document {
        id: row.try_get("id")?,
        collection,
        data: serde_json::from_str(&data)?,
        created_at: millis_to_datetime(row.try_get("created_at")?)?,
        updated_at: millis_to_datetime(row.try_get("updated_at")?)?,
    })
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

fn millis_to_datetime(millis: i64) -> AppResult<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp_millis(millis)
        .ok_or_else(|| AppError::Internal(format!("timestamp {} out of range", millis)))
}

fn ensure_parent_dir(database_url: &str) -> AppResult<()> {
    let path = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AppError::DatabaseError(format!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::document_store::SortDirection;
    use serde_json::json;
    use tempfile::tempdir;

    async fn store() -> SqliteDocumentStore {
        SqliteDocumentStore::new_in_memory(16).await.unwrap()
    }

    #[tokio::test]
    async fn test_add_then_get() {
        let store = store().await;
        let doc = store
            .add(Collection::Pages, json!({"slug": "about", "title": "About", "id": "ignored"}))
            .await
            .unwrap();
        assert_ne!(doc.id, "ignored");
        assert_eq!(doc.created_at, doc.updated_at);

        let fetched = store.get(Collection::Pages, &doc.id).await.unwrap().unwrap();
        assert_eq!(fetched, doc);
        assert!(store.get(Collection::Blogs, &doc.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_rejects_non_object() {
        let store = store().await;
        let err = store.add(Collection::Pages, json!("text")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_update_merges_and_invalidates_cache() {
        let store = store().await;
        let doc = store
            .add(Collection::Pages, json!({"slug": "about", "title": "About"}))
            .await
            .unwrap();
        // warm the cache
        store.get(Collection::Pages, &doc.id).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        let updated = store
            .update(Collection::Pages, &doc.id, json!({"title": "About us"}))
            .await
            .unwrap();
        assert_eq!(updated.data, json!({"slug": "about", "title": "About us"}));
        assert!(updated.updated_at > doc.updated_at);
        assert_eq!(updated.created_at, doc.created_at);

        let fetched = store.get(Collection::Pages, &doc.id).await.unwrap().unwrap();
        assert_eq!(fetched.data["title"], "About us");
    }

    #[tokio::test]
    async fn test_update_checked_sees_latest_row() {
        let store = store().await;
        let doc = store
            .add(Collection::Keywords, json!({"a": 1, "b": 1}))
            .await
            .unwrap();
        store
            .update(Collection::Keywords, &doc.id, json!({"a": 2}))
            .await
            .unwrap();

        let sum_at_most_three = |merged: &Value| -> AppResult<()> {
            let sum = merged["a"].as_i64().unwrap_or(0) + merged["b"].as_i64().unwrap_or(0);
            if sum > 3 {
                return Err(AppError::Validation(format!("a + b = {}", sum)));
            }
            Ok(())
        };
        // valid against the first version of the row, not the current one
        let err = store
            .update_checked(Collection::Keywords, &doc.id, json!({"b": 2}), &sum_at_most_three)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let stored = store.get(Collection::Keywords, &doc.id).await.unwrap().unwrap();
        assert_eq!(stored.data, json!({"a": 2, "b": 1}));

        let updated = store
            .update_checked(Collection::Keywords, &doc.id, json!({"a": 1}), &sum_at_most_three)
            .await
            .unwrap();
        assert_eq!(updated.data, json!({"a": 1, "b": 1}));
    }

    #[tokio::test]
    async fn test_stale_read_does_not_refill_cache() {
        let store = store().await;
        let doc = store
            .add(Collection::Pages, json!({"slug": "about", "title": "Old"}))
            .await
            .unwrap();

        // a read that started before the update finishes after it
        let epoch = store.current_epoch();
        let stale = store.fetch_live(Collection::Pages, &doc.id).await.unwrap().unwrap();
        store
            .update(Collection::Pages, &doc.id, json!({"title": "New"}))
            .await
            .unwrap();
        store
            .fill_cache((Collection::Pages, doc.id.clone()), stale, epoch)
            .await;

        let fetched = store.get(Collection::Pages, &doc.id).await.unwrap().unwrap();
        assert_eq!(fetched.data["title"], "New");
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = store().await;
        let err = store
            .update(Collection::Pages, "nope", json!({"title": "x"}))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_soft_delete_hides_document() {
        let store = store().await;
        let doc = store.add(Collection::Users, json!({"email": "a@b.ae"})).await.unwrap();
        store.get(Collection::Users, &doc.id).await.unwrap();

        store.delete(Collection::Users, &doc.id).await.unwrap();
        assert!(store.get(Collection::Users, &doc.id).await.unwrap().is_none());
        assert!(store.list(Collection::Users).await.unwrap().is_empty());
        assert_eq!(store.count(Collection::Users).await.unwrap(), 0);
        assert!(matches!(
            store.delete(Collection::Users, &doc.id).await,
            Err(AppError::NotFound(_))
        ));
        assert!(store
            .update(Collection::Users, &doc.id, json!({"email": "c@d.ae"}))
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_query_filters_order_and_limit() {
        let store = store().await;
        for (slug, status, views, featured) in [
            ("a", "published", 10, true),
            ("b", "draft", 50, false),
            ("c", "published", 30, false),
            ("d", "published", 20, true),
        ] {
            store
                .add(
                    Collection::Blogs,
                    json!({"slug": slug, "status": status, "stats": {"views": views}, "featured": featured}),
                )
                .await
                .unwrap();
        }

        let published = store
            .query(
                Collection::Blogs,
                &DocumentQuery::new()
                    .where_eq("status", "published")
                    .order_by("stats.views", SortDirection::Desc),
            )
            .await
            .unwrap();
        let slugs: Vec<_> = published.iter().map(|d| d.data["slug"].clone()).collect();
        assert_eq!(slugs, vec![json!("c"), json!("d"), json!("a")]);

        let popular = store
            .query(
                Collection::Blogs,
                &DocumentQuery::new()
                    .filter("stats.views", FilterOp::Gte, 20)
                    .order_by("stats.views", SortDirection::Asc)
                    .limit(2),
            )
            .await
            .unwrap();
        let slugs: Vec<_> = popular.iter().map(|d| d.data["slug"].clone()).collect();
        assert_eq!(slugs, vec![json!("d"), json!("c")]);

        let featured = store
            .query(Collection::Blogs, &DocumentQuery::new().where_eq("featured", true))
            .await
            .unwrap();
        assert_eq!(featured.len(), 2);

        let missing = store
            .query(Collection::Blogs, &DocumentQuery::new().where_eq("category", Value::Null))
            .await
            .unwrap();
        assert_eq!(missing.len(), 4);
    }

    #[tokio::test]
    async fn test_query_rejects_bad_field_path() {
        let store = store().await;
        let err = store
            .query(Collection::Pages, &DocumentQuery::new().where_eq("a b", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_set_upserts_and_keeps_created_at() {
        let store = store().await;
        let first = store
            .set(Collection::SiteSettings, "global", json!({"siteName": "One"}))
            .await
            .unwrap();
        let second = store
            .set(Collection::SiteSettings, "global", json!({"phone": "+971"}))
            .await
            .unwrap();
        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.data, json!({"phone": "+971"}));
        assert_eq!(store.count(Collection::SiteSettings).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_file_database_persists_across_connections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("cms.db");
        let url = format!("sqlite://{}", path.display());

        let id = {
            let store = SqliteDocumentStore::connect(&url, 8).await.unwrap();
            store
                .add(Collection::Keywords, json!({"keyword": "gratuity"}))
                .await
                .unwrap()
                .id
        };

        let reopened = SqliteDocumentStore::connect(&url, 8).await.unwrap();
        let doc = reopened.get(Collection::Keywords, &id).await.unwrap().unwrap();
        assert_eq!(doc.data["keyword"], "gratuity");
    }
}
