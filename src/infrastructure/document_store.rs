// Document Store Interface - generic get/add/update/delete/query over JSON documents
// Every CMS collection goes through this layer; typed access lives in services::repository.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AppError, AppResult};
use crate::models::Collection;

static FIELD_PATH_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(\.[A-Za-z_][A-Za-z0-9_]*)*$").expect("field path regex")
});

/// Fields maintained by the store rather than held in `data`.
pub const META_FIELDS: [&str; 3] = ["id", "createdAt", "updatedAt"];

/// A stored document. `data` never contains the metadata fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: String,
    pub collection: Collection,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Flattened JSON as API clients see it: data fields plus id and timestamps.
    pub fn to_json(&self) -> Value {
        let mut out = match &self.data {
            Value::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        out.insert("id".to_string(), Value::String(self.id.clone()));
        // fixed-width timestamps so they sort lexically
        out.insert(
            "createdAt".to_string(),
            Value::String(self.created_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        out.insert(
            "updatedAt".to_string(),
            Value::String(self.updated_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        Value::Object(out)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
}

impl FilterOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::Ne => "!=",
            FilterOp::Lt => "<",
            FilterOp::Lte => "<=",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: String,
    pub op: FilterOp,
    pub value: Value,
}

/// `where(...)`, `orderBy(...)`, `limit(...)` in one value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentQuery {
    pub filters: Vec<FieldFilter>,
    pub order_by: Option<(String, SortDirection)>,
    pub limit: Option<u32>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            op,
            value: value.into(),
        });
        self
    }

    pub fn where_eq(self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filter(field, FilterOp::Eq, value)
    }

    pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.order_by = Some((field.into(), direction));
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn validate(&self) -> AppResult<()> {
        for filter in &self.filters {
            validate_field_path(&filter.field)?;
            match &filter.value {
                Value::Array(_) | Value::Object(_) => {
                    return Err(AppError::Validation(format!(
                        "filter on '{}' must compare against a scalar",
                        filter.field
                    )))
                }
                Value::Null if !matches!(filter.op, FilterOp::Eq | FilterOp::Ne) => {
                    return Err(AppError::Validation(format!(
                        "null can only be compared with == or != (field '{}')",
                        filter.field
                    )))
                }
                _ => {}
            }
        }
        if let Some((field, _)) = &self.order_by {
            validate_field_path(field)?;
        }
        Ok(())
    }
}

pub fn validate_field_path(field: &str) -> AppResult<()> {
    if FIELD_PATH_RE.is_match(field) {
        Ok(())
    } else {
        Err(AppError::Validation(format!("invalid field path '{}'", field)))
    }
}

/// Strip store-maintained fields from an incoming payload and require an object.
pub fn document_body(mut data: Value) -> AppResult<Value> {
    match data.as_object_mut() {
        Some(map) => {
            for field in META_FIELDS {
                map.remove(field);
            }
            Ok(data)
        }
        None => Err(AppError::Validation(
            "document body must be a JSON object".to_string(),
        )),
    }
}

/// Shallow merge: top-level keys of `partial` replace those in `base`.
pub fn merge_partial(base: &mut Value, partial: Value) -> AppResult<()> {
    let partial = document_body(partial)?;
    match (base.as_object_mut(), partial) {
        (Some(target), Value::Object(fields)) => {
            for (key, value) in fields {
                target.insert(key, value);
            }
            Ok(())
        }
        _ => Err(AppError::Internal(
            "stored document is not a JSON object".to_string(),
        )),
    }
}

/// Validation run against a merged document before it is written.
pub type DocumentCheck = dyn Fn(&Value) -> AppResult<()> + Send + Sync;

#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: Collection, id: &str) -> AppResult<Option<Document>>;

    /// Every live document in the collection, oldest first.
    async fn list(&self, collection: Collection) -> AppResult<Vec<Document>>;

    async fn query(&self, collection: Collection, query: &DocumentQuery) -> AppResult<Vec<Document>>;

    /// Insert under a generated id.
    async fn add(&self, collection: Collection, data: Value) -> AppResult<Document>;

    /// Insert or fully replace under a caller-chosen id.
    async fn set(&self, collection: Collection, id: &str, data: Value) -> AppResult<Document>;

    async fn update(&self, collection: Collection, id: &str, partial: Value) -> AppResult<Document> {
        self.update_checked(collection, id, partial, &|_: &Value| -> AppResult<()> { Ok(()) })
            .await
    }

    /// Shallow-merge `partial` and write the result only if `check` accepts
    /// the merged document. Read, check and write happen atomically.
    async fn update_checked(
        &self,
        collection: Collection,
        id: &str,
        partial: Value,
        check: &DocumentCheck,
    ) -> AppResult<Document>;

    /// Soft delete: hidden from reads, kept in storage.
    async fn delete(&self, collection: Collection, id: &str) -> AppResult<()>;

    async fn count(&self, collection: Collection) -> AppResult<u64>;
}
