// Gratuity CMS Server

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use gratuity_cms::{app_state::AppState, config::Config, server::create_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    if config.admin.token.is_none() {
        info!("ADMIN_TOKEN not set; admin API will reject every request");
    }

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;
    let app = create_app(app_state);

    // Start server
    let addr = config.server_address();
    info!("Gratuity CMS starting on http://{}", addr);
    info!("  POST   /api/calculate                      - Calculate gratuity");
    info!("  GET    /api/pages/{{slug}}                   - Published page");
    info!("  GET    /api/admin/collections/{{collection}} - List documents (admin)");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
