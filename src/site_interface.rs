// Site Interface - public API the marketing site renders from: calculator,
// SEO scoring, published content, navigation, contact form, sitemap and redirects.

use axum::{
    extract::{Path as AxumPath, Query, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{
    app_state::AppState,
    infrastructure::middleware::AppJson,
    calculator::{self, ContractType, GratuityBreakdown, GratuityInput, ServicePeriod},
    error::{AppError, AppResult},
    models::{Calculation, MenuLocation},
    seo::{self, render_robots, render_sitemap, SeoInput, SeoReport},
    services::{
        location_pages::LocationPage,
        menu_service::menu_links,
        site_content::{BlogPostView, PageView},
        ContactSubmission, Repository,
    },
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculateRequest {
    pub basic_salary: f64,
    /// Either this or `servicePeriod` must be given; this wins when both are.
    pub years_of_service: Option<f64>,
    pub service_period: Option<ServicePeriod>,
    #[serde(default)]
    pub contract_type: ContractType,
    /// Page the calculator was used on, kept with the stored calculation.
    pub source_path: Option<String>,
}

impl CalculateRequest {
    pub fn to_input(&self) -> AppResult<GratuityInput> {
        let years_of_service = match (self.years_of_service, &self.service_period) {
            (Some(years), _) => years,
            (None, Some(period)) => period.years_of_service()?,
            (None, None) => {
                return Err(AppError::Validation(
                    "either yearsOfService or servicePeriod is required".to_string(),
                ))
            }
        };
        Ok(GratuityInput {
            basic_salary: self.basic_salary,
            years_of_service,
            contract_type: self.contract_type,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct WidgetQuery {
    pub placement: Option<String>,
}

// HTTP Handlers

pub async fn calculate_handler(
    State(state): State<AppState>,
    AppJson(req): AppJson<CalculateRequest>,
) -> Result<Json<GratuityBreakdown>, AppError> {
    let input = req.to_input()?;
    let breakdown = calculator::calculate(&input)?;

    // Stored for reporting only; a failed write never fails the calculation.
    let record = Calculation::from_breakdown(&breakdown, req.source_path.clone());
    if let Err(e) = Repository::<Calculation>::new(state.store.clone())
        .create(&record)
        .await
    {
        warn!("Failed to store calculation: {}", e);
    }
    Ok(Json(breakdown))
}

pub async fn seo_score_handler(AppJson(input): AppJson<SeoInput>) -> Json<SeoReport> {
    Json(seo::score(&input))
}

pub async fn page_handler(
    State(state): State<AppState>,
    AxumPath(slug): AxumPath<String>,
) -> Result<Json<PageView>, AppError> {
    let site = state.settings().site_info().await?;
    Ok(Json(state.site_content().page(&slug, &site, Utc::now()).await?))
}

pub async fn blog_index_handler(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let posts = state.site_content().blog_index(Utc::now()).await?;
    Ok(Json(json!({"posts": posts})))
}

pub async fn blog_post_handler(
    State(state): State<AppState>,
    AxumPath(slug): AxumPath<String>,
) -> Result<Json<BlogPostView>, AppError> {
    let site = state.settings().site_info().await?;
    Ok(Json(
        state
            .site_content()
            .blog_post(&slug, &site, Utc::now())
            .await?,
    ))
}

pub async fn locations_handler(State(state): State<AppState>) -> Result<Json<Value>, AppError> {
    let locations: Vec<Value> = state
        .locations()
        .list_live(Utc::now())
        .await?
        .into_iter()
        .map(|record| {
            json!({
                "slug": record.data.slug,
                "name": record.data.name,
                "kind": record.data.kind,
                "emirate": record.data.emirate,
                "contractType": record.data.contract_type,
                "path": record.data.path(),
            })
        })
        .collect();
    Ok(Json(json!({"locations": locations})))
}

pub async fn location_page_handler(
    State(state): State<AppState>,
    AxumPath(slug): AxumPath<String>,
) -> Result<Json<LocationPage>, AppError> {
    let site = state.settings().site_info().await?;
    Ok(Json(
        state
            .locations()
            .page_for(&slug, &site, Utc::now())
            .await?,
    ))
}

pub async fn menu_handler(
    State(state): State<AppState>,
    AxumPath(location): AxumPath<String>,
) -> Result<Json<Value>, AppError> {
    let location: MenuLocation = location.parse()?;
    let menu = state.menus().active_menu(location).await?;
    let links = menu_links(&menu.data);
    Ok(Json(json!({"menu": menu, "links": links})))
}

pub async fn widgets_handler(
    State(state): State<AppState>,
    Query(query): Query<WidgetQuery>,
) -> Result<Json<Value>, AppError> {
    let placement = query
        .placement
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("placement is required".to_string()))?;
    let widgets = state.menus().widgets_for(&placement).await?;
    Ok(Json(json!({"placement": placement, "widgets": widgets})))
}

pub async fn contact_handler(
    State(state): State<AppState>,
    AppJson(submission): AppJson<ContactSubmission>,
) -> Result<Json<Value>, AppError> {
    let submission = submission.normalized()?;
    state.contact.forward(&submission).await?;
    Ok(Json(json!({"success": true})))
}

pub async fn sitemap_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    let site = state.settings().site_info().await?;
    let entries = state.site_content().sitemap_entries(Utc::now()).await?;
    let xml = render_sitemap(&site.url, &entries)?;
    Ok(([(header::CONTENT_TYPE, "application/xml; charset=utf-8")], xml).into_response())
}

pub async fn robots_handler(State(state): State<AppState>) -> Result<Response, AppError> {
    let site = state.settings().site_info().await?;
    let body = render_robots(&site.url, &site.extra_disallow);
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], body).into_response())
}

/// Anything no route matched: follow a redirect if one applies, otherwise 404.
pub async fn fallback_handler(State(state): State<AppState>, uri: Uri) -> Result<Response, AppError> {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or_else(|| uri.path());
    match state.redirects().resolve_path(target).await? {
        Some(resolved) => {
            info!("Redirect {} -> {}", uri.path(), resolved.location);
            let status = StatusCode::from_u16(resolved.status_code)
                .unwrap_or(StatusCode::MOVED_PERMANENTLY);
            Ok((status, [(header::LOCATION, resolved.location)]).into_response())
        }
        None => Err(AppError::NotFound(format!("no route for {}", uri.path()))),
    }
}

// Create public site router
pub fn create_site_router(state: AppState) -> Router {
    Router::new()
        // Calculator and SEO tools
        .route("/api/calculate", post(calculate_handler))
        .route("/api/seo/score", post(seo_score_handler))
        // Published content
        .route("/api/pages/{slug}", get(page_handler))
        .route("/api/blog", get(blog_index_handler))
        .route("/api/blog/{slug}", get(blog_post_handler))
        .route("/api/locations", get(locations_handler))
        .route("/api/locations/{slug}", get(location_page_handler))
        // Navigation and widgets
        .route("/api/menus/{location}", get(menu_handler))
        .route("/api/widgets", get(widgets_handler))
        .route("/api/contact", post(contact_handler))
        // Crawlers
        .route("/sitemap.xml", get(sitemap_handler))
        .route("/robots.txt", get(robots_handler))
        .fallback(fallback_handler)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_calculate_request_prefers_years() {
        let req: CalculateRequest = serde_json::from_value(json!({
            "basicSalary": 3000.0,
            "yearsOfService": 3.0,
            "servicePeriod": {"startDate": "2020-01-01", "endDate": "2020-12-31"}
        }))
        .unwrap();
        let input = req.to_input().unwrap();
        assert_eq!(input.years_of_service, 3.0);
        assert_eq!(input.contract_type, ContractType::Unlimited);
    }

    #[test]
    fn test_calculate_request_from_period() {
        let req = CalculateRequest {
            basic_salary: 3000.0,
            years_of_service: None,
            service_period: Some(ServicePeriod::new(
                NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2021, 12, 31).unwrap(),
                0,
            )),
            contract_type: ContractType::Difc,
            source_path: None,
        };
        let input = req.to_input().unwrap();
        assert!((input.years_of_service - 1.0).abs() < 1e-9);
        assert_eq!(input.contract_type, ContractType::Difc);
    }

    #[test]
    fn test_calculate_request_needs_service() {
        let req: CalculateRequest =
            serde_json::from_value(json!({"basicSalary": 3000.0})).unwrap();
        assert!(matches!(req.to_input(), Err(AppError::Validation(_))));
    }
}
