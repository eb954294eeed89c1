use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{require_non_empty, require_schedule, require_slug, Faq, SeoMeta, Status};
use super::{CmsDocument, Collection, Publishable};
use crate::error::AppResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PageTemplate {
    #[default]
    Standard,
    Calculator,
    Landing,
    Legal,
}

/// CMS-managed page. `home` is served at the site root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub template: PageTemplate,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<SeoMeta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faqs: Vec<Faq>,
}

impl Page {
    pub fn path(&self) -> String {
        if self.slug == "home" {
            "/".to_string()
        } else {
            format!("/{}", self.slug)
        }
    }
}

impl CmsDocument for Page {
    const COLLECTION: Collection = Collection::Pages;

    fn validate(&self) -> AppResult<()> {
        require_slug(&self.slug)?;
        require_non_empty("title", &self.title)?;
        require_schedule(self.status, self.publish_at)
    }
}

impl Publishable for Page {
    fn slug(&self) -> &str {
        &self.slug
    }
    fn status(&self) -> Status {
        self.status
    }
    fn publish_at(&self) -> Option<DateTime<Utc>> {
        self.publish_at
    }
}
