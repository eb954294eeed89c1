use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{require_non_empty, require_schedule, require_slug, Faq, SeoMeta, Status};
use super::{CmsDocument, Collection, Publishable};
use crate::calculator::ContractType;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationKind {
    Emirate,
    FreeZone,
    Landmark,
}

impl LocationKind {
    pub fn path_prefix(&self) -> &'static str {
        match self {
            LocationKind::Emirate => "/locations",
            LocationKind::FreeZone => "/free-zones",
            LocationKind::Landmark => "/landmarks",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LocationKind::Emirate => "Locations",
            LocationKind::FreeZone => "Free Zones",
            LocationKind::Landmark => "Landmarks",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub slug: String,
    pub name: String,
    pub kind: LocationKind,
    pub emirate: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Employment regime that governs gratuity for people working here.
    #[serde(default)]
    pub contract_type: ContractType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seo: Option<SeoMeta>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub faqs: Vec<Faq>,
}

impl Location {
    pub fn path(&self) -> String {
        format!("{}/{}", self.kind.path_prefix(), self.slug)
    }
}

impl CmsDocument for Location {
    const COLLECTION: Collection = Collection::Locations;

    fn validate(&self) -> AppResult<()> {
        require_slug(&self.slug)?;
        require_non_empty("name", &self.name)?;
        require_non_empty("emirate", &self.emirate)?;
        require_schedule(self.status, self.publish_at)?;
        if let Some(lat) = self.latitude {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(AppError::Validation(format!("latitude {} out of range", lat)));
            }
        }
        if let Some(lng) = self.longitude {
            if !(-180.0..=180.0).contains(&lng) {
                return Err(AppError::Validation(format!("longitude {} out of range", lng)));
            }
        }
        Ok(())
    }
}

impl Publishable for Location {
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
