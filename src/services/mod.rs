// Services - business logic above the document store

pub mod contact;
pub mod content_sync;
pub mod dashboard;
pub mod keyword_tracker;
pub mod listing;
pub mod location_pages;
pub mod menu_service;
pub mod redirect_resolver;
pub mod repository;
pub mod settings;
pub mod site_content;

pub use contact::{ContactForwarder, ContactSubmission, FormspreeForwarder};
pub use content_sync::{ContentSyncService, SyncOutcome};
pub use keyword_tracker::KeywordTracker;
pub use location_pages::LocationService;
pub use menu_service::MenuService;
pub use redirect_resolver::RedirectService;
pub use repository::{Record, Repository};
pub use settings::SettingsService;
pub use site_content::SiteContent;
