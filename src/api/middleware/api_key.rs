//! `x-api-key` authentication for third-party callers.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde_json::json;

use crate::domain::entities::ApiKey;
use crate::error::AppError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "x-api-key";

/// The API key that authenticated the request, if one was presented.
///
/// # Authentication Flow
///
/// 1. No `x-api-key` header: `None`, or `401` when keys are required
/// 2. Header present: HMAC the value and look up a non-revoked key
/// 3. Unknown or revoked key: `401` regardless of the requirement setting
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(ApiCaller(key): ApiCaller) {
///     let owner = key.map(|k| k.owner_id());
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiCaller(pub Option<ApiKey>);

impl FromRequestParts<AppState> for ApiCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(API_KEY_HEADER) else {
            if state.settings.require_api_key {
                return Err(AppError::unauthorized(
                    "API key required. Add x-api-key header.",
                    json!({ "reason": "missing header" }),
                ));
            }
            return Ok(ApiCaller(None));
        };

        let raw_key = value.to_str().map_err(|_| {
            AppError::unauthorized("Invalid API key", json!({ "reason": "non-ASCII header" }))
        })?;

        let key = state.auth_service.authenticate(raw_key).await?;
        tracing::debug!(key_id = key.id, "Request authenticated by API key");

        Ok(ApiCaller(Some(key)))
    }
}
