use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::common::require_non_empty;
use super::{CmsDocument, Collection};
use crate::error::{AppError, AppResult};

/// Lowest search position we accept (page 10 of results).
pub const MAX_TRACKED_POSITION: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankSnapshot {
    pub date: NaiveDate,
    pub position: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
    New,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Keyword {
    pub keyword: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_volume: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<u8>,
    #[serde(default)]
    pub history: Vec<RankSnapshot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
}

impl Keyword {
    pub fn current_position(&self) -> Option<u32> {
        self.history.last().map(|s| s.position)
    }

    /// Positional change between the last two snapshots; positive means the page climbed.
    pub fn position_change(&self) -> Option<i64> {
        match self.history.as_slice() {
            [.., previous, latest] => Some(i64::from(previous.position) - i64::from(latest.position)),
            _ => None,
        }
    }

    pub fn trend(&self) -> Trend {
        match self.position_change() {
            None => Trend::New,
            Some(change) if change > 0 => Trend::Up,
            Some(change) if change < 0 => Trend::Down,
            Some(_) => Trend::Stable,
        }
    }

    /// Insert a snapshot, replacing any existing one for the same date. History stays date-ordered.
    pub fn record(&mut self, snapshot: RankSnapshot) -> AppResult<()> {
        validate_position(snapshot.position)?;
        match self.history.binary_search_by_key(&snapshot.date, |s| s.date) {
            Ok(index) => self.history[index] = snapshot,
            Err(index) => self.history.insert(index, snapshot),
        }
        Ok(())
    }
}

fn validate_position(position: u32) -> AppResult<()> {
    if position == 0 || position > MAX_TRACKED_POSITION {
        return Err(AppError::Validation(format!(
            "ranking position must be between 1 and {}, got {}",
            MAX_TRACKED_POSITION, position
        )));
    }
    Ok(())
}

impl CmsDocument for Keyword {
    const COLLECTION: Collection = Collection::Keywords;

    fn validate(&self) -> AppResult<()> {
        require_non_empty("keyword", &self.keyword)?;
        if let Some(difficulty) = self.difficulty {
            if difficulty > 100 {
                return Err(AppError::Validation(format!(
                    "difficulty must be 0-100, got {}",
                    difficulty
                )));
            }
        }
        for pair in self.history.windows(2) {
            if pair[0].date >= pair[1].date {
                return Err(AppError::Validation(
                    "ranking history must be strictly date-ordered".to_string(),
                ));
            }
        }
        self.history
            .iter()
            .try_for_each(|snapshot| validate_position(snapshot.position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(day: u32, position: u32) -> RankSnapshot {
        RankSnapshot {
            date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
            position,
        }
    }

    fn keyword() -> Keyword {
        Keyword {
            keyword: "gratuity calculator uae".to_string(),
            target_url: Some("/".to_string()),
            search_volume: Some(9900),
            difficulty: Some(42),
            history: Vec::new(),
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_trend_from_last_two_entries() {
        let mut kw = keyword();
        assert_eq!(kw.trend(), Trend::New);

        kw.record(snapshot(1, 12)).unwrap();
        assert_eq!(kw.trend(), Trend::New);

        kw.record(snapshot(2, 8)).unwrap();
        assert_eq!(kw.trend(), Trend::Up);
        assert_eq!(kw.position_change(), Some(4));

        kw.record(snapshot(3, 9)).unwrap();
        assert_eq!(kw.trend(), Trend::Down);

        kw.record(snapshot(4, 9)).unwrap();
        assert_eq!(kw.trend(), Trend::Stable);
        assert_eq!(kw.current_position(), Some(9));
    }

    #[test]
    fn test_record_keeps_history_sorted_and_replaces_same_day() {
        let mut kw = keyword();
        kw.record(snapshot(5, 20)).unwrap();
        kw.record(snapshot(1, 30)).unwrap();
        kw.record(snapshot(5, 15)).unwrap();
        assert_eq!(kw.history, vec![snapshot(1, 30), snapshot(5, 15)]);
        kw.validate().unwrap();
    }

    #[test]
    fn test_rejects_out_of_range_positions() {
        let mut kw = keyword();
        assert!(kw.record(snapshot(1, 0)).is_err());
        assert!(kw.record(snapshot(1, 101)).is_err());
        assert!(kw.history.is_empty());
    }
}
