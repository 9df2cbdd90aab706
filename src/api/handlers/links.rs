//! Handlers for first-party link management (create, list, delete).
//!
//! Every route requires the `X-Owner-Id` header; see [`OwnerId`].

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection, rejection::PathRejection},
    http::{HeaderMap, StatusCode},
};
use serde_json::json;
use validator::Validate;

use super::{json_body, origin};
use crate::api::dto::links::{LinkDto, LinkListResponse};
use crate::api::dto::shorten::ShortenRequest;
use crate::api::middleware::owner::OwnerId;
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link owned by the caller.
///
/// # Endpoint
///
/// `POST /api/links`
///
/// # Request Body
///
/// ```json
/// { "url": "https://example.com/page", "customCode": "promo" }
/// ```
///
/// # Errors
///
/// Same as `POST /shorten`, plus 400 when `X-Owner-Id` is missing.
pub async fn create_link_handler(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    headers: HeaderMap,
    payload: Result<Json<ShortenRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<LinkDto>), AppError> {
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

    let short_url = state.short_url(origin(&headers), &record.code);

    Ok((StatusCode::CREATED, Json(LinkDto::from_record(record, short_url))))
}

/// Lists the caller's valid links, newest first.
///
/// # Endpoint
///
/// `GET /api/links`
///
/// # Response
///
/// ```json
/// {
///   "items": [{ "id": 3, "code": "aZ3kP9", "shortUrl": "...", "targetUrl": "...",
///               "createdAt": "...", "expiresAt": "..." }],
///   "count": 1,
///   "quota": 11,
///   "remaining": 10,
///   "hasCustomCode": false
/// }
/// ```
pub async fn list_links_handler(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    headers: HeaderMap,
) -> Result<Json<LinkListResponse>, AppError> {
    let listing = state.alias_service.list(&owner_id).await?;
    let origin = origin(&headers);

    Ok(Json(LinkListResponse::from_listing(listing, |code| {
        state.short_url(origin, code)
    })))
}

/// Deletes one of the caller's links.
///
/// # Endpoint
///
/// `DELETE /api/links/{id}`
///
/// # Errors
///
/// Returns 404 Not Found if the id does not exist or belongs to another owner.
/// Returns 400 Bad Request if the id is not an integer.
pub async fn delete_link_handler(
    State(state): State<AppState>,
    OwnerId(owner_id): OwnerId,
    id: Result<Path<i64>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = id.map_err(|rejection| {
        AppError::bad_request("Invalid link id", json!({ "reason": rejection.body_text() }))
    })?;

    state.alias_service.delete(&owner_id, id).await?;

    Ok(StatusCode::NO_CONTENT)
}
