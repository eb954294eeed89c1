// Seeds a database with the location catalog and starter menus.

use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gratuity_cms::{
    config::Config,
    data_seeder::seed_defaults,
    infrastructure::{document_store::DocumentStore, sqlite_database::SqliteDocumentStore},
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!("Seeding database at {}", config.database.url);

    let store: Arc<dyn DocumentStore> =
        Arc::new(SqliteDocumentStore::connect(&config.database.url, config.cache.capacity).await?);
    let summary = seed_defaults(store).await?;

    info!(
        "Done: {} locations and {} menus created",
        summary.locations, summary.menus
    );
    Ok(())
}
