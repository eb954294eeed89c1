// Admin dashboard summary.

use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::AppResult;
use crate::infrastructure::document_store::DocumentStore;
use crate::models::{Collection, Status};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct StatusCounts {
    pub draft: u64,
    pub published: u64,
    pub scheduled: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Live document count per collection name.
    pub counts: BTreeMap<&'static str, u64>,
    /// Publication states for the collections that have them.
    pub statuses: BTreeMap<&'static str, StatusCounts>,
}

pub async fn summarize(store: &dyn DocumentStore) -> AppResult<DashboardSummary> {
    let mut counts = BTreeMap::new();
    let mut statuses = BTreeMap::new();
    for collection in Collection::ALL {
        if collection.has_status() {
            let docs = store.list(collection).await?;
            let mut tally = StatusCounts::default();
            for doc in &docs {
                let status = doc
                    .data
                    .get("status")
                    .cloned()
                    .and_then(|v: Value| serde_json::from_value::<Status>(v).ok())
                    .unwrap_or_default();
                match status {
                    Status::Draft => tally.draft += 1,
                    Status::Published => tally.published += 1,
                    Status::Scheduled => tally.scheduled += 1,
                }
            }
            counts.insert(collection.as_str(), docs.len() as u64);
            statuses.insert(collection.as_str(), tally);
        } else {
            counts.insert(collection.as_str(), store.count(collection).await?);
        }
    }
    Ok(DashboardSummary { counts, statuses })
}
