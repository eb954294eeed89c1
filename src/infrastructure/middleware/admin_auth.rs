// Admin auth middleware - guards the admin API with the configured bearer token
// and tags each admin request with an id for the logs.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{app_state::AppState, error::AppError};

/// Request-scoped marker inserted for authenticated admin requests.
#[derive(Debug, Clone)]
pub struct AdminContext {
    pub request_id: String,
}

// Only present when admin_auth_middleware ran, so a handler that asks for it
// cannot be reached without a valid token.
impl<S> FromRequestParts<S> for AdminContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        let context = parts
            .extensions
            .get::<AdminContext>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized("admin authentication required".to_string()));

        async move { context }
    }
}

pub async fn admin_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(expected) = state.config.admin.token.as_deref() else {
        warn!("Admin request refused: ADMIN_TOKEN is not configured");
        return Err(AppError::Unauthorized(
            "admin API is disabled".to_string(),
        ));
    };

    match extract_bearer_token(request.headers()) {
        Some(token) if tokens_match(token, expected) => {}
        Some(_) => {
            warn!("Admin request with invalid token: {} {}", request.method(), request.uri().path());
            return Err(AppError::Unauthorized("invalid admin token".to_string()));
        }
        None => {
            return Err(AppError::Unauthorized(
                "missing bearer token".to_string(),
            ))
        }
    }

    let context = AdminContext {
        request_id: format!("admin-{}", Uuid::new_v4()),
    };
    info!(
        "[{}] {} {}",
        context.request_id,
        request.method(),
        request.uri().path()
    );
    request.extensions_mut().insert(context);
    Ok(next.run(request).await)
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get("authorization")?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Compare without stopping at the first differing byte.
fn tokens_match(given: &str, expected: &str) -> bool {
    given.len() == expected.len()
        && given
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
