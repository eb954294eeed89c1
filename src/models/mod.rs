// CMS data model - every record is a JSON document in a named collection

pub mod blog;
pub mod calculation;
pub mod common;
pub mod keyword;
pub mod location;
pub mod menu;
pub mod page;
pub mod redirect;
pub mod settings;
pub mod user;
pub mod widget;

pub use blog::BlogPost;
pub use calculation::Calculation;
pub use common::{Faq, RobotsDirectives, SeoMeta, Status};
pub use keyword::{Keyword, RankSnapshot, Trend};
pub use location::{Location, LocationKind};
pub use menu::{MegaMenuColumn, MenuConfig, MenuItem, MenuLocation};
pub use page::{Page, PageTemplate};
pub use redirect::Redirect;
pub use settings::{SeoSettings, SiteSettings, SocialLink, SETTINGS_DOC_ID};
pub use user::{User, UserRole};
pub use widget::{Widget, WidgetKind};

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Collection {
    #[serde(rename = "pages")]
    Pages,
    #[serde(rename = "blogs")]
    Blogs,
    #[serde(rename = "locations")]
    Locations,
    #[serde(rename = "calculations")]
    Calculations,
    #[serde(rename = "users")]
    Users,
    #[serde(rename = "keywords")]
    Keywords,
    #[serde(rename = "redirects")]
    Redirects,
    #[serde(rename = "seoSettings")]
    SeoSettings,
    #[serde(rename = "siteSettings")]
    SiteSettings,
    #[serde(rename = "menus")]
    Menus,
    #[serde(rename = "widgets")]
    Widgets,
}

impl Collection {
    pub const ALL: [Collection; 11] = [
        Collection::Pages,
        Collection::Blogs,
        Collection::Locations,
        Collection::Calculations,
        Collection::Users,
        Collection::Keywords,
        Collection::Redirects,
        Collection::SeoSettings,
        Collection::SiteSettings,
        Collection::Menus,
        Collection::Widgets,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Pages => "pages",
            Collection::Blogs => "blogs",
            Collection::Locations => "locations",
            Collection::Calculations => "calculations",
            Collection::Users => "users",
            Collection::Keywords => "keywords",
            Collection::Redirects => "redirects",
            Collection::SeoSettings => "seoSettings",
            Collection::SiteSettings => "siteSettings",
            Collection::Menus => "menus",
            Collection::Widgets => "widgets",
        }
    }

    /// Collections whose records carry a draft/published/scheduled status.
    pub fn has_status(&self) -> bool {
        matches!(
            self,
            Collection::Pages | Collection::Blogs | Collection::Locations
        )
    }

    /// Decode `data` as this collection's model and run its validation.
    /// Returns the document re-encoded with model defaults filled in.
    pub fn validate_document(&self, data: &Value) -> AppResult<Value> {
        match self {
            Collection::Pages => check::<Page>(data),
            Collection::Blogs => check::<BlogPost>(data),
            Collection::Locations => check::<Location>(data),
            Collection::Calculations => check::<Calculation>(data),
            Collection::Users => check::<User>(data),
            Collection::Keywords => check::<Keyword>(data),
            Collection::Redirects => check::<Redirect>(data),
            Collection::SeoSettings => check::<SeoSettings>(data),
            Collection::SiteSettings => check::<SiteSettings>(data),
            Collection::Menus => check::<MenuConfig>(data),
            Collection::Widgets => check::<Widget>(data),
        }
    }
}

fn check<T: CmsDocument>(data: &Value) -> AppResult<Value> {
    let record: T = serde_json::from_value(data.clone()).map_err(|e| {
        AppError::Validation(format!("invalid {} document: {}", T::COLLECTION, e))
    })?;
    record.validate()?;
    Ok(serde_json::to_value(&record)?)
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Collection {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Collection::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| AppError::NotFound(format!("unknown collection '{}'", s)))
    }
}

/// A model stored in exactly one collection.
pub trait CmsDocument: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn validate(&self) -> AppResult<()> {
        Ok(())
    }
}

/// Content that is addressed by slug and gated by publication status.
pub trait Publishable {
    fn slug(&self) -> &str;
    fn status(&self) -> Status;
    fn publish_at(&self) -> Option<DateTime<Utc>>;

    fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.status().is_live(self.publish_at(), now)
    }
}
