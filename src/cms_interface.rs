// CMS Interface - admin API over every collection, plus dashboard, content
// sync and keyword tracking. Every route sits behind the admin token.

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::StatusCode,
    middleware,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tracing::info;

use crate::{
    app_state::AppState,
    error::{AppError, AppResult},
    infrastructure::{
        document_store::{document_body, merge_partial},
        middleware::{admin_auth_middleware, AdminContext, AppJson},
    },
    models::{Collection, RankSnapshot, Redirect, SETTINGS_DOC_ID},
    services::{
        dashboard,
        keyword_tracker::KeywordReport,
        listing::{self, ListParams},
        SyncOutcome,
    },
};

fn parse_collection(name: &str) -> AppResult<Collection> {
    name.parse()
}

/// Settings collections hold one document under a fixed id.
fn is_singleton(collection: Collection) -> bool {
    matches!(collection, Collection::SiteSettings | Collection::SeoSettings)
}

async fn check_redirect(state: &AppState, data: &Value, replacing: Option<&str>) -> AppResult<()> {
    let candidate: Redirect = serde_json::from_value(data.clone())
        .map_err(|e| AppError::Validation(format!("invalid redirects document: {}", e)))?;
    state.redirects().ensure_no_loop(&candidate, replacing).await
}

// HTTP Handlers

pub async fn list_documents_handler(
    State(state): State<AppState>,
    AxumPath(collection): AxumPath<String>,
    Query(params): Query<ListParams>,
) -> Result<Json<listing::ListPage>, AppError> {
    let collection = parse_collection(&collection)?;
    let docs = state.store.list(collection).await?;
    Ok(Json(listing::apply(docs, &params)?))
}

pub async fn create_document_handler(
    State(state): State<AppState>,
    admin: AdminContext,
    AxumPath(collection): AxumPath<String>,
    AppJson(body): AppJson<Value>,
) -> Result<Response, AppError> {
    let collection = parse_collection(&collection)?;
    let data = collection.validate_document(&document_body(body)?)?;
    if collection == Collection::Redirects {
        check_redirect(&state, &data, None).await?;
    }

    let doc = if is_singleton(collection) {
        state.store.set(collection, SETTINGS_DOC_ID, data).await?
    } else {
        state.store.add(collection, data).await?
    };
    info!("[{}] Created {}/{}", admin.request_id, collection, doc.id);
    Ok((StatusCode::CREATED, Json(doc.to_json())).into_response())
}

pub async fn get_document_handler(
    State(state): State<AppState>,
    AxumPath((collection, id)): AxumPath<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let collection = parse_collection(&collection)?;
    match state.store.get(collection, &id).await? {
        Some(doc) => Ok(Json(doc.to_json())),
        None => Err(AppError::NotFound(format!("{}/{} not found", collection, id))),
    }
}

pub async fn update_document_handler(
    State(state): State<AppState>,
    admin: AdminContext,
    AxumPath((collection, id)): AxumPath<(String, String)>,
    AppJson(partial): AppJson<Value>,
) -> Result<Json<Value>, AppError> {
    let collection = parse_collection(&collection)?;
    if collection == Collection::Redirects {
        let current = state
            .store
            .get(collection, &id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("{}/{} not found", collection, id)))?;
        let mut merged = current.data;
        merge_partial(&mut merged, partial.clone())?;
        let merged = collection.validate_document(&merged)?;
        check_redirect(&state, &merged, Some(&id)).await?;
    }

    // the merged document must still be a valid record at write time
    let check = move |merged: &Value| -> AppResult<()> {
        collection.validate_document(merged).map(|_| ())
    };
    let doc = state
        .store
        .update_checked(collection, &id, partial, &check)
        .await?;
    info!("[{}] Updated {}/{}", admin.request_id, collection, id);
    Ok(Json(doc.to_json()))
}

pub async fn delete_document_handler(
    State(state): State<AppState>,
    admin: AdminContext,
    AxumPath((collection, id)): AxumPath<(String, String)>,
) -> Result<Json<Value>, AppError> {
    let collection = parse_collection(&collection)?;
    state.store.delete(collection, &id).await?;
    info!("[{}] Deleted {}/{}", admin.request_id, collection, id);
    Ok(Json(json!({"id": id, "deleted": true})))
}

pub async fn dashboard_handler(
    State(state): State<AppState>,
) -> Result<Json<dashboard::DashboardSummary>, AppError> {
    Ok(Json(dashboard::summarize(state.store.as_ref()).await?))
}

pub async fn discover_pages_handler(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let pages = state.content_sync().discover_pages().await?;
    Ok(Json(json!({"pages": pages})))
}

pub async fn sync_page_handler(
    State(state): State<AppState>,
    admin: AdminContext,
    AxumPath(slug): AxumPath<String>,
) -> Result<Response, AppError> {
    let outcome = state.content_sync().sync_page(&slug).await?;
    info!("[{}] Synced page {}", admin.request_id, slug);
    let status = match outcome {
        SyncOutcome::Created { .. } => StatusCode::CREATED,
        SyncOutcome::AlreadySynced { .. } => StatusCode::OK,
    };
    Ok((status, Json(outcome)).into_response())
}

pub async fn record_ranking_handler(
    State(state): State<AppState>,
    admin: AdminContext,
    AxumPath(id): AxumPath<String>,
    AppJson(snapshot): AppJson<RankSnapshot>,
) -> Result<Json<Value>, AppError> {
    let record = state.keywords().record_ranking(&id, snapshot).await?;
    info!("[{}] Recorded ranking for keyword {}", admin.request_id, id);
    Ok(Json(json!({
        "id": record.id,
        "keyword": record.data.keyword,
        "currentPosition": record.data.current_position(),
        "trend": record.data.trend(),
        "history": record.data.history,
    })))
}

pub async fn keyword_report_handler(
    State(state): State<AppState>,
) -> Result<Json<KeywordReport>, AppError> {
    Ok(Json(state.keywords().report().await?))
}

// Create admin router
pub fn create_admin_router(state: AppState) -> Router {
    Router::new()
        // Generic collection operations
        .route(
            "/collections/{collection}",
            get(list_documents_handler).post(create_document_handler),
        )
        .route(
            "/collections/{collection}/{id}",
            get(get_document_handler)
                .patch(update_document_handler)
                .delete(delete_document_handler),
        )
        .route("/dashboard", get(dashboard_handler))
        // Content sync
        .route("/sync/discover", get(discover_pages_handler))
        .route("/sync/{slug}", post(sync_page_handler))
        // Keyword tracking
        .route("/keywords/report", get(keyword_report_handler))
        .route("/keywords/{id}/rankings", post(record_ranking_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            admin_auth_middleware,
        ))
        .with_state(state)
}
