// Site identity: config defaults overlaid with the singleton settings documents.

use std::sync::Arc;
use tracing::warn;

use super::repository::Repository;
use crate::config::SiteConfig;
use crate::error::AppResult;
use crate::infrastructure::document_store::DocumentStore;
use crate::models::{SeoSettings, SiteSettings, SETTINGS_DOC_ID};
use crate::seo::SiteInfo;

/// Overlay the settings documents onto the configured name and URL.
pub fn merge_site_info(config: &SiteConfig, site: &SiteSettings, seo: &SeoSettings) -> SiteInfo {
    let name = site
        .site_name
        .clone()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| config.name.clone());
    let mut info = SiteInfo::new(name, config.url.clone());
    info.logo_url = site.logo_url.clone();
    info.contact_email = site.contact_email.clone();
    info.phone = site.phone.clone();
    info.address = site.address.clone();
    info.social_urls = site.social.iter().map(|link| link.url.clone()).collect();
    info.title_template = seo.title_template.clone();
    info.default_description = seo.default_description.clone();
    info.default_og_image = seo.default_og_image.clone();
    info.extra_disallow = seo.extra_disallow.clone();
    info
}

#[derive(Clone)]
pub struct SettingsService {
    config: SiteConfig,
    site: Repository<SiteSettings>,
    seo: Repository<SeoSettings>,
}

impl SettingsService {
    pub fn new(config: SiteConfig, store: Arc<dyn DocumentStore>) -> Self {
        Self {
            config,
            site: Repository::new(store.clone()),
            seo: Repository::new(store),
        }
    }

    /// Missing or undecodable settings documents fall back to defaults.
    pub async fn site_info(&self) -> AppResult<SiteInfo> {
        let site = match self.site.get(SETTINGS_DOC_ID).await {
            Ok(record) => record.map(|r| r.data).unwrap_or_default(),
            Err(e) => {
                warn!("Ignoring site settings: {}", e);
                SiteSettings::default()
            }
        };
        let seo = match self.seo.get(SETTINGS_DOC_ID).await {
            Ok(record) => record.map(|r| r.data).unwrap_or_default(),
            Err(e) => {
                warn!("Ignoring SEO settings: {}", e);
                SeoSettings::default()
            }
        };
        Ok(merge_site_info(&self.config, &site, &seo))
    }
}
