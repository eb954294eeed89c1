use std::sync::Arc;

use crate::{
    config::Config,
    infrastructure::{document_store::DocumentStore, sqlite_database::SqliteDocumentStore},
    services::{
        ContactForwarder, ContentSyncService, FormspreeForwarder, KeywordTracker, LocationService,
        MenuService, RedirectService, SettingsService, SiteContent,
    },
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub contact: Arc<dyn ContactForwarder>,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = SqliteDocumentStore::connect(&config.database.url, config.cache.capacity).await?;
        let contact = FormspreeForwarder::new(config.contact.formspree_endpoint.clone())?;
        Ok(Self::with_parts(config, Arc::new(store), Arc::new(contact)))
    }

    /// Assemble state from already-built parts (tests swap in their own forwarder).
    pub fn with_parts(
        config: Config,
        store: Arc<dyn DocumentStore>,
        contact: Arc<dyn ContactForwarder>,
    ) -> Self {
        Self {
            config,
            store,
            contact,
        }
    }

    pub fn settings(&self) -> SettingsService {
        SettingsService::new(self.config.site.clone(), self.store.clone())
    }

    pub fn site_content(&self) -> SiteContent {
        SiteContent::new(self.store.clone())
    }

    pub fn locations(&self) -> LocationService {
        LocationService::new(self.store.clone())
    }

    pub fn menus(&self) -> MenuService {
        MenuService::new(self.store.clone())
    }

    pub fn redirects(&self) -> RedirectService {
        RedirectService::new(self.store.clone())
    }

    pub fn content_sync(&self) -> ContentSyncService {
        ContentSyncService::new(self.store.clone())
    }

    pub fn keywords(&self) -> KeywordTracker {
        KeywordTracker::new(self.store.clone())
    }
}
