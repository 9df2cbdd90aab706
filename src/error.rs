//! Application error taxonomy and its HTTP mapping.
//!
//! Every variant carries a short human-readable `message` (returned to the
//! client) and free-form `details` (logged, never returned).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::{Value, json};

/// Body shape shared by every error response: `{"error": "<message>"}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The target URL is missing or is not a well-formed absolute URL.
    #[error("{message}")]
    InvalidUrl { message: String, details: Value },

    /// The requested custom code violates alphabet, length or reserved-word rules.
    #[error("{message}")]
    InvalidCode { message: String, details: Value },

    /// Malformed request that is neither a URL nor a code problem.
    #[error("{message}")]
    Validation { message: String, details: Value },

    /// The code is already held by another record.
    #[error("{message}")]
    CodeTaken { message: String, details: Value },

    /// The owner already holds the maximum number of valid records.
    #[error("{message}")]
    QuotaExceeded { message: String, details: Value },

    /// The code or record does not exist, or has expired.
    #[error("{message}")]
    NotFound { message: String, details: Value },

    /// Missing or invalid API key.
    #[error("{message}")]
    Unauthorized { message: String, details: Value },

    /// Store unavailable or unexpected failure. The only retriable variant.
    #[error("{message}")]
    Internal { message: String, details: Value },
}

impl AppError {
    pub fn invalid_url(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidUrl {
            message: message.into(),
            details,
        }
    }

    pub fn invalid_code(message: impl Into<String>, details: Value) -> Self {
        Self::InvalidCode {
            message: message.into(),
            details,
        }
    }

    pub fn bad_request(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn code_taken(message: impl Into<String>, details: Value) -> Self {
        Self::CodeTaken {
            message: message.into(),
            details,
        }
    }

    pub fn quota_exceeded(message: impl Into<String>, details: Value) -> Self {
        Self::QuotaExceeded {
            message: message.into(),
            details,
        }
    }

    pub fn not_found(message: impl Into<String>, details: Value) -> Self {
        Self::NotFound {
            message: message.into(),
            details,
        }
    }

    pub fn unauthorized(message: impl Into<String>, details: Value) -> Self {
        Self::Unauthorized {
            message: message.into(),
            details,
        }
    }

    pub fn internal(message: impl Into<String>, details: Value) -> Self {
        Self::Internal {
            message: message.into(),
            details,
        }
    }

    /// HTTP status code this error maps to.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidUrl { .. } | Self::InvalidCode { .. } | Self::Validation { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::CodeTaken { .. } => StatusCode::CONFLICT,
            Self::QuotaExceeded { .. } => StatusCode::FORBIDDEN,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether a caller may retry the same request with backoff.
    pub fn is_retriable(&self) -> bool {
        matches!(self, Self::Internal { .. })
    }

    fn details(&self) -> &Value {
        match self {
            Self::InvalidUrl { details, .. }
            | Self::InvalidCode { details, .. }
            | Self::Validation { details, .. }
            | Self::CodeTaken { details, .. }
            | Self::QuotaExceeded { details, .. }
            | Self::NotFound { details, .. }
            | Self::Unauthorized { details, .. }
            | Self::Internal { details, .. } => details,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(error = %self, details = %self.details(), "Request failed");
        } else {
            tracing::debug!(error = %self, details = %self.details(), "Request rejected");
        }

        let body = ErrorBody {
            error: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        if let Some(db) = e.as_database_error()
            && db.is_unique_violation()
        {
            return AppError::code_taken(
                "Custom code already in use",
                json!({ "constraint": db.constraint() }),
            );
        }

        AppError::internal("Internal server error", json!({ "reason": e.to_string() }))
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .find_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .unwrap_or_else(|| "Invalid request".to_string());

        AppError::bad_request(message, json!({ "fields": errors.to_string() }))
    }
}
