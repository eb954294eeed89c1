use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// Publication state shared by every content record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Draft,
    Published,
    Scheduled,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Draft => "draft",
            Status::Published => "published",
            Status::Scheduled => "scheduled",
        }
    }

    /// Published records are live; scheduled ones go live once `publish_at` has passed.
    pub fn is_live(&self, publish_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match self {
            Status::Published => true,
            Status::Scheduled => publish_at.map(|at| at <= now).unwrap_or(false),
            Status::Draft => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RobotsDirectives {
    #[serde(default = "default_true")]
    pub index: bool,
    #[serde(default = "default_true")]
    pub follow: bool,
}

impl Default for RobotsDirectives {
    fn default() -> Self {
        Self {
            index: true,
            follow: true,
        }
    }
}

impl RobotsDirectives {
    pub fn content(&self) -> String {
        format!(
            "{}, {}",
            if self.index { "index" } else { "noindex" },
            if self.follow { "follow" } else { "nofollow" }
        )
    }
}

fn default_true() -> bool {
    true
}

/// Per-record SEO overrides edited in the admin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SeoMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus_keyword: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub canonical: Option<String>,
    #[serde(default)]
    pub robots: RobotsDirectives,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub og_image: Option<String>,
}

impl SeoMeta {
    /// Focus keyword first, then any secondary keywords.
    pub fn keyword_list(&self) -> Vec<String> {
        self.focus_keyword
            .iter()
            .chain(self.keywords.iter())
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

pub(crate) fn require_non_empty(field: &str, value: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{} must not be empty", field)));
    }
    Ok(())
}

pub(crate) fn require_slug(value: &str) -> AppResult<()> {
    if !crate::seo::is_valid_slug(value) {
        return Err(AppError::Validation(format!(
            "slug '{}' must be lowercase letters, digits and single hyphens",
            value
        )));
    }
    Ok(())
}

/// Scheduled records need a publish time to ever go live.
pub(crate) fn require_schedule(status: Status, publish_at: Option<DateTime<Utc>>) -> AppResult<()> {
    if status == Status::Scheduled && publish_at.is_none() {
        return Err(AppError::Validation(
            "scheduled records require publishAt".to_string(),
        ));
    }
    Ok(())
}
