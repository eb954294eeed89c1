use serde::{Deserialize, Serialize};

use super::{CmsDocument, Collection};
use crate::error::{AppError, AppResult};

pub const ALLOWED_STATUS_CODES: [u16; 4] = [301, 302, 307, 308];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Redirect {
    /// Site path, optionally ending in `/*` to match everything below it.
    pub source: String,
    pub destination: String,
    #[serde(default = "default_status_code")]
    pub status_code: u16,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub hits: u64,
}

fn default_status_code() -> u16 {
    301
}

fn default_active() -> bool {
    true
}

impl Redirect {
    pub fn is_prefix_rule(&self) -> bool {
        self.source.ends_with("/*")
    }
}

impl CmsDocument for Redirect {
    const COLLECTION: Collection = Collection::Redirects;

    fn validate(&self) -> AppResult<()> {
        if !self.source.starts_with('/') {
            return Err(AppError::Validation(format!(
                "redirect source '{}' must be a site path starting with '/'",
                self.source
            )));
        }
        let external = self.destination.starts_with("https://") || self.destination.starts_with("http://");
        if !external && !self.destination.starts_with('/') {
            return Err(AppError::Validation(format!(
                "redirect destination '{}' must be a site path or an absolute URL",
                self.destination
            )));
        }
        if !ALLOWED_STATUS_CODES.contains(&self.status_code) {
            return Err(AppError::Validation(format!(
                "redirect status code {} is not one of {:?}",
                self.status_code, ALLOWED_STATUS_CODES
            )));
        }
        if crate::services::redirect_resolver::normalize_path(&self.source)
            == crate::services::redirect_resolver::normalize_path(&self.destination)
        {
            return Err(AppError::Validation(format!(
                "redirect from '{}' points at itself",
                self.source
            )));
        }
        Ok(())
    }
}
