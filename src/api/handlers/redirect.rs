//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use tracing::{debug, error, warn};
use url::Url;

use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its target URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Behavior
///
/// - Valid code: `302 Found` to the stored target
/// - Unknown, expired, or any failure: `302 Found` to `HOME_URL`
///
/// This endpoint never renders an error body. Expired records are deleted as
/// a side effect of resolution.
pub async fn redirect_handler(Path(code): Path<String>, State(state): State<AppState>) -> Response {
    let location = match state.alias_service.resolve(&code).await {
        Ok(target) => match Url::parse(&target.target_url) {
            Ok(url) => {
                debug!(code, "Redirecting");
                url.to_string()
            }
            Err(e) => {
                warn!(code, error = %e, "Stored target no longer parses");
                state.settings.home_url.clone()
            }
        },
        Err(AppError::NotFound { .. }) => {
            debug!(code, "Unknown or expired code, redirecting home");
            state.settings.home_url.clone()
        }
        Err(e) => {
            error!(code, error = %e, "Failed to resolve code, redirecting home");
            state.settings.home_url.clone()
        }
    };

    found(&location)
}

fn found(location: &str) -> Response {
    let value = HeaderValue::from_str(location).unwrap_or_else(|_| HeaderValue::from_static("/"));
    (StatusCode::FOUND, [(header::LOCATION, value)]).into_response()
}
