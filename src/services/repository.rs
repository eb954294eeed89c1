// Typed access to one collection. Decodes documents into their model and
// validates every write against it.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::warn;

use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::{Document, DocumentQuery, DocumentStore};
use crate::models::{CmsDocument, Publishable};

/// A decoded document with its store metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record<T> {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub data: T,
}

impl<T: CmsDocument> Record<T> {
    pub fn from_document(doc: Document) -> AppResult<Self> {
        let data = serde_json::from_value(doc.data).map_err(|e| {
            AppError::SerializationError(format!(
                "{}/{} does not decode: {}",
                T::COLLECTION,
                doc.id,
                e
            ))
        })?;
        Ok(Self {
            id: doc.id,
            created_at: doc.created_at,
            updated_at: doc.updated_at,
            data,
        })
    }
}

pub struct Repository<T> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: CmsDocument> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub async fn get(&self, id: &str) -> AppResult<Option<Record<T>>> {
        self.store
            .get(T::COLLECTION, id)
            .await?
            .map(Record::from_document)
            .transpose()
    }

    pub async fn require(&self, id: &str) -> AppResult<Record<T>> {
        self.get(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{}/{} not found", T::COLLECTION, id)))
    }

    /// Every record that decodes. Documents that no longer match the model are skipped.
    pub async fn list(&self) -> AppResult<Vec<Record<T>>> {
        let docs = self.store.list(T::COLLECTION).await?;
        Ok(decode_all(docs))
    }

    pub async fn query(&self, query: &DocumentQuery) -> AppResult<Vec<Record<T>>> {
        let docs = self.store.query(T::COLLECTION, query).await?;
        Ok(decode_all(docs))
    }

    pub async fn find_one(&self, field: &str, value: impl Into<Value>) -> AppResult<Option<Record<T>>> {
        let query = DocumentQuery::new().where_eq(field, value).limit(1);
        Ok(self.query(&query).await?.into_iter().next())
    }

    pub async fn create(&self, data: &T) -> AppResult<Record<T>> {
        data.validate()?;
        let doc = self.store.add(T::COLLECTION, serde_json::to_value(data)?).await?;
        Record::from_document(doc)
    }

    pub async fn set(&self, id: &str, data: &T) -> AppResult<Record<T>> {
        data.validate()?;
        let doc = self
            .store
            .set(T::COLLECTION, id, serde_json::to_value(data)?)
            .await?;
        Record::from_document(doc)
    }

    /// Apply a partial update. The merged result must still be a valid `T`.
    pub async fn update(&self, id: &str, partial: Value) -> AppResult<Record<T>> {
        let check = |merged: &Value| -> AppResult<()> {
            let candidate: T = serde_json::from_value(merged.clone()).map_err(|e| {
                AppError::Validation(format!("invalid {} document: {}", T::COLLECTION, e))
            })?;
            candidate.validate()
        };
        let doc = self
            .store
            .update_checked(T::COLLECTION, id, partial, &check)
            .await?;
        Record::from_document(doc)
    }

    pub async fn delete(&self, id: &str) -> AppResult<()> {
        self.store.delete(T::COLLECTION, id).await
    }
}

impl<T: CmsDocument + Publishable> Repository<T> {
    /// The live record with this slug, if any.
    pub async fn find_live_by_slug(&self, slug: &str, now: DateTime<Utc>) -> AppResult<Option<Record<T>>> {
        let query = DocumentQuery::new().where_eq("slug", slug);
        Ok(self
            .query(&query)
            .await?
            .into_iter()
            .find(|record| record.data.is_live(now)))
    }

    pub async fn list_live(&self, now: DateTime<Utc>) -> AppResult<Vec<Record<T>>> {
        Ok(self
            .list()
            .await?
            .into_iter()
            .filter(|record| record.data.is_live(now))
            .collect())
    }
}

fn decode_all<T: CmsDocument>(docs: Vec<Document>) -> Vec<Record<T>> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match Record::from_document(doc) {
                Ok(record) => Some(record),
                Err(e) => {
                    warn!("Skipping undecodable {}/{}: {}", T::COLLECTION, id, e);
                    None
                }
            }
        })
        .collect()
}
