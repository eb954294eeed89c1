use serde::{Deserialize, Serialize};

use super::{CmsDocument, Collection};
use crate::error::{AppError, AppResult};

/// Document id of the singleton settings records.
pub const SETTINGS_DOC_ID: &str = "global";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLink {
    pub network: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default)]
    pub social: Vec<SocialLink>,
}

impl CmsDocument for SiteSettings {
    const COLLECTION: Collection = Collection::SiteSettings;

    fn validate(&self) -> AppResult<()> {
        if let Some(email) = &self.contact_email {
            if !super::user::is_valid_email(email) {
                return Err(AppError::Validation(format!("'{}' is not a valid email", email)));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SeoSettings {
    /// `{title}` is replaced with the page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_template: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_og_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub google_site_verification: Option<String>,
    #[serde(default)]
    pub extra_disallow: Vec<String>,
}

impl CmsDocument for SeoSettings {
    const COLLECTION: Collection = Collection::SeoSettings;

    fn validate(&self) -> AppResult<()> {
        if let Some(template) = &self.title_template {
            if !template.contains("{title}") {
                return Err(AppError::Validation(
                    "titleTemplate must contain {title}".to_string(),
                ));
            }
        }
        if let Some(path) = self.extra_disallow.iter().find(|p| !p.starts_with('/')) {
            return Err(AppError::Validation(format!(
                "disallow rule '{}' must start with '/'",
                path
            )));
        }
        Ok(())
    }
}
