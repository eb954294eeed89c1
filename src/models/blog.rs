use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{require_non_empty, require_schedule, require_slug, Faq, SeoMeta, Status};
use super::{CmsDocument, Collection, Publishable};
use crate::error::AppResult;

pub const WORDS_PER_MINUTE: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub slug: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<SeoMeta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faqs: Vec<Faq>,
}

impl BlogPost {
    pub fn path(&self) -> String {
        format!("/blog/{}", self.slug)
    }

    /// Whole minutes, never less than one.
    pub fn reading_time_minutes(&self) -> usize {
        let words = self.content.split_whitespace().count();
        words.div_ceil(WORDS_PER_MINUTE).max(1)
    }
}

impl CmsDocument for BlogPost {
    const COLLECTION: Collection = Collection::Blogs;

    fn validate(&self) -> AppResult<()> {
        require_slug(&self.slug)?;
        require_non_empty("title", &self.title)?;
        require_schedule(self.status, self.publish_at)
    }
}

impl Publishable for BlogPost {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reading_time() {
        let mut post: BlogPost = serde_json::from_str(
            r#"{"slug": "gratuity-guide", "title": "Gratuity guide"}"#,
        )
        .unwrap();
        assert_eq!(post.reading_time_minutes(), 1);

        post.content = vec!["word"; 401].join(" ");
        assert_eq!(post.reading_time_minutes(), 3);
        assert_eq!(post.path(), "/blog/gratuity-guide");
    }

    #[test]
    fn test_scheduled_post_requires_publish_time() {
        let post: BlogPost = serde_json::from_str(
            r#"{"slug": "later", "title": "Later", "status": "scheduled"}"#,
        )
        .unwrap();
        assert!(post.validate().is_err());
    }
}
