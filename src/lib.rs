// Gratuity CMS - UAE gratuity calculator site and content management backend

// Gratuity formula and service period arithmetic
pub mod calculator;

// Document models for every CMS collection
pub mod models;

// SEO scoring, metadata, structured data and sitemaps
pub mod seo;

// Document store, cache and HTTP middleware
pub mod infrastructure;

// Domain services built on the document store
pub mod services;

// HTTP surface
pub mod app_state;
pub mod cms_interface;
pub mod server;
pub mod site_interface;

// Common utilities
pub mod config;
pub mod data_seeder;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
