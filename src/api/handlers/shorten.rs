//! Handler for the embeddable shortening endpoint.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::HeaderMap,
};
use serde_json::json;
use validator::Validate;

use super::{json_body, origin};
use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::api::middleware::api_key::ApiCaller;
use crate::api::middleware::owner::owner_from_headers;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link for a third-party caller.
///
/// # Endpoint
///
/// `POST /shorten`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/page", "customCode": "promo" }
/// ```
///
/// # Response
///
/// ```json
/// {
///   "shortUrl": "https://sho.rt/promo",
///   "shortCode": "promo",
///   "originalUrl": "https://example.com/page",
///   "expiresAt": "2026-11-16T10:00:00Z"
/// }
/// ```
///
/// `shortUrl` is built on the request's `Origin` when present, otherwise on
/// `PUBLIC_BASE_URL`.
///
/// # Owner
///
/// `api_{id}` when authenticated by `x-api-key`, else the `X-Owner-Id` header.
/// A request with neither is rejected, so unrelated callers never share a
/// quota. Key-scoped owners are not subject to the quota.
///
/// # Errors
///
/// - 400 missing/invalid URL, invalid custom code, malformed body
/// - 401 invalid API key, missing key when required, or neither key nor owner id
/// - 403 quota exceeded
/// - 409 custom code already in use
/// - 500 internal error
pub async fn shorten_handler(
    State(state): State<AppState>,
    ApiCaller(api_key): ApiCaller,
    headers: HeaderMap,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<Json<ShortenResponse>, AppError> {
    let owner_id = match api_key {
        Some(key) => key.owner_id(),
        None => owner_from_headers(&headers)?.ok_or_else(|| {
            AppError::unauthorized(
                "API key or X-Owner-Id header required",
                json!({ "reason": "no owner" }),
            )
        })?,
    };

    let request = json_body(payload)?;
    request.validate()?;

    let record = state
        .alias_service
        .allocate(
            request.url.as_deref().unwrap_or_default(),
            request.custom_code.as_deref(),
            &owner_id,
        )
        .await?;

    Ok(Json(ShortenResponse {
        short_url: state.short_url(origin(&headers), &record.code),
        short_code: record.code,
        original_url: record.target_url,
        expires_at: record.expires_at,
    }))
}
