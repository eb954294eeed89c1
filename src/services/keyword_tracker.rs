// Keyword ranking history and the rankings report shown on the admin dashboard.

use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use super::repository::{Record, Repository};
use crate::error::AppResult;
use crate::infrastructure::document_store::DocumentStore;
use crate::models::{Keyword, RankSnapshot, Trend};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordReportEntry {
    pub id: String,
    pub keyword: String,
    pub target_url: Option<String>,
    pub search_volume: Option<u32>,
    pub current_position: Option<u32>,
    pub best_position: Option<u32>,
    pub change: Option<i64>,
    pub trend: Trend,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordSummary {
    pub total: usize,
    pub ranked: usize,
    pub top_three: usize,
    pub top_ten: usize,
    pub improving: usize,
    pub declining: usize,
    pub average_position: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KeywordReport {
    pub summary: KeywordSummary,
    pub keywords: Vec<KeywordReportEntry>,
}

/// Report rows ordered by current position; keywords never ranked go last.
pub fn build_report(records: &[Record<Keyword>]) -> KeywordReport {
    let mut keywords: Vec<KeywordReportEntry> = records
        .iter()
        .map(|record| KeywordReportEntry {
            id: record.id.clone(),
            keyword: record.data.keyword.clone(),
            target_url: record.data.target_url.clone(),
            search_volume: record.data.search_volume,
            current_position: record.data.current_position(),
            best_position: record.data.history.iter().map(|s| s.position).min(),
            change: record.data.position_change(),
            trend: record.data.trend(),
        })
        .collect();
    keywords.sort_by_key(|entry| (entry.current_position.unwrap_or(u32::MAX), entry.keyword.clone()));

    let positions: Vec<u32> = keywords.iter().filter_map(|k| k.current_position).collect();
    let summary = KeywordSummary {
        total: keywords.len(),
        ranked: positions.len(),
        top_three: positions.iter().filter(|p| **p <= 3).count(),
        top_ten: positions.iter().filter(|p| **p <= 10).count(),
        improving: keywords.iter().filter(|k| k.trend == Trend::Up).count(),
        declining: keywords.iter().filter(|k| k.trend == Trend::Down).count(),
        average_position: if positions.is_empty() {
            None
        } else {
            let sum: u64 = positions.iter().map(|p| u64::from(*p)).sum();
            Some((sum as f64 / positions.len() as f64 * 10.0).round() / 10.0)
        },
    };
    KeywordReport { summary, keywords }
}

#[derive(Clone)]
pub struct KeywordTracker {
    repo: Repository<Keyword>,
}

impl KeywordTracker {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            repo: Repository::new(store),
        }
    }

    /// Add a ranking snapshot, replacing any already recorded for that date.
    pub async fn record_ranking(&self, id: &str, snapshot: RankSnapshot) -> AppResult<Record<Keyword>> {
        let mut keyword = self.repo.require(id).await?.data;
        keyword.record(snapshot)?;
        let updated = self
            .repo
            .update(id, json!({"history": keyword.history}))
            .await?;
        info!(
            "Recorded position {} for '{}' on {}",
            snapshot.position, updated.data.keyword, snapshot.date
        );
        Ok(updated)
    }

    pub async fn report(&self) -> AppResult<KeywordReport> {
        Ok(build_report(&self.repo.list().await?))
    }
}
