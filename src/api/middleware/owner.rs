//! Owner scoping key taken from the `X-Owner-Id` header.
//!
//! The value is an opaque client-generated identifier. It scopes listing,
//! quota and deletion; it is not an identity and is never authenticated.

use axum::{extract::FromRequestParts, http::HeaderMap, http::request::Parts};
use serde_json::json;

use crate::domain::entities::API_OWNER_PREFIX;
use crate::error::AppError;

pub const OWNER_HEADER: &str = "x-owner-id";

const MAX_OWNER_ID_LENGTH: usize = 128;

/// Reads the owner id from `headers`.
///
/// Returns `Ok(None)` when the header is absent or blank.
///
/// # Errors
///
/// Returns [`AppError::Validation`] if the value is not visible ASCII, is too
/// long, or uses the reserved `api_` prefix.
pub fn owner_from_headers(headers: &HeaderMap) -> Result<Option<String>, AppError> {
    let Some(value) = headers.get(OWNER_HEADER) else {
        return Ok(None);
    };

    let owner = value
        .to_str()
        .map_err(|_| invalid_owner("X-Owner-Id must be visible ASCII"))?
        .trim();

    if owner.is_empty() {
        return Ok(None);
    }
    if owner.len() > MAX_OWNER_ID_LENGTH {
        return Err(invalid_owner("X-Owner-Id is too long"));
    }
    if owner.starts_with(API_OWNER_PREFIX) {
        return Err(invalid_owner("X-Owner-Id uses a reserved prefix"));
    }

    Ok(Some(owner.to_string()))
}

fn invalid_owner(message: &str) -> AppError {
    AppError::bad_request(message, json!({ "header": OWNER_HEADER }))
}

/// Extractor for routes that require an owner.
///
/// Rejects with `400 {"error": "X-Owner-Id header is required"}` when absent.
#[derive(Debug, Clone)]
pub struct OwnerId(pub String);

impl<S: Send + Sync> FromRequestParts<S> for OwnerId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        owner_from_headers(&parts.headers)?
            .map(OwnerId)
            .ok_or_else(|| invalid_owner("X-Owner-Id header is required"))
    }
}
