// Application router: public site routes, the admin API and shared layers.

use axum::Router;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{app_state::AppState, cms_interface::create_admin_router, site_interface::create_site_router};

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .nest("/api/admin", create_admin_router(state.clone()))
        .merge(create_site_router(state))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}
