// Admin list screens: filter, search, sort and page a collection in memory
// after fetching all of it.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use crate::error::{AppError, AppResult};
use crate::infrastructure::document_store::{validate_field_path, Document, SortDirection};
use crate::models::Status;

pub const DEFAULT_PAGE_SIZE: usize = 50;
pub const MAX_PAGE_SIZE: usize = 500;

/// Fields the free-text search looks at, whichever a collection has.
pub const SEARCH_FIELDS: [&str; 8] = [
    "title",
    "name",
    "slug",
    "keyword",
    "email",
    "displayName",
    "source",
    "destination",
];

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub status: Option<Status>,
    pub search: Option<String>,
    /// Dotted field path; defaults to `updatedAt`.
    pub sort: Option<String>,
    /// Defaults to descending when no sort field is given, ascending otherwise.
    pub direction: Option<SortDirection>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ListPage {
    pub items: Vec<Value>,
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |value, key| value.get(key))
}

/// Nulls and missing fields sort after every present value, in either direction.
fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        // mixed types: order by type rank so the result is at least stable
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Bool(_) => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Array(_) => 3,
        Value::Object(_) => 4,
        Value::Null => 5,
    }
}

fn matches_search(doc: &Value, needle: &str) -> bool {
    SEARCH_FIELDS.iter().any(|field| {
        doc.get(*field)
            .and_then(Value::as_str)
            .is_some_and(|text| text.to_lowercase().contains(needle))
    })
}

pub fn apply(docs: Vec<Document>, params: &ListParams) -> AppResult<ListPage> {
    let sort_field = params.sort.clone().unwrap_or_else(|| "updatedAt".to_string());
    validate_field_path(&sort_field)?;
    let direction = params.direction.unwrap_or(if params.sort.is_none() {
        SortDirection::Desc
    } else {
        SortDirection::Asc
    });
    let limit = params.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    if limit == 0 || limit > MAX_PAGE_SIZE {
        return Err(AppError::BadRequest(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    let offset = params.offset.unwrap_or(0);
    let needle = params
        .search
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty());

    let mut items: Vec<Value> = docs
        .iter()
        .map(Document::to_json)
        .filter(|doc| match params.status {
            Some(status) => doc.get("status").and_then(Value::as_str) == Some(status.as_str()),
            None => true,
        })
        .filter(|doc| needle.as_deref().map_or(true, |n| matches_search(doc, n)))
        .collect();

    items.sort_by(|a, b| {
        let key_a = lookup(a, &sort_field).filter(|v| !v.is_null());
        let key_b = lookup(b, &sort_field).filter(|v| !v.is_null());
        match (key_a, key_b) {
            (Some(x), Some(y)) => match direction {
                SortDirection::Asc => compare_present(x, y),
                SortDirection::Desc => compare_present(y, x),
            },
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }
    });

    let total = items.len();
    let items = items.into_iter().skip(offset).take(limit).collect();
    Ok(ListPage {
        items,
        total,
        offset,
        limit,
    })
}
