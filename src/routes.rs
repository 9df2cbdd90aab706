//! Top-level router configuration.
//!
//! # Route Structure
//!
//! - `GET  /{code}`      - Short link redirect (public, never errors)
//! - `GET  /health`      - Health check: store and cache (public)
//! - `POST /shorten`     - Embeddable shortening endpoint (open CORS, optional API key)
//! - `/api/links*`       - First-party link management (`X-Owner-Id` required)
//!
//! # Middleware
//!
//! - **Tracing** - Structured request/response logging
//! - **CORS** - Open policy on `/shorten` only
//! - **Path normalization** - Trailing slash handling

use crate::api;
use crate::api::handlers::{health_handler, redirect_handler, shorten_handler};
use crate::api::middleware::{cors, tracing};
use crate::state::AppState;
use axum::Router;
use axum::routing::{get, post};
use tower::Layer;
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};

/// Constructs the application routes and per-route middleware.
///
/// Static routes (`/health`, `/shorten`) take precedence over `/{code}`, so
/// those names are rejected as custom codes.
pub fn build_router(state: AppState) -> Router {
    let shorten_router = Router::new()
        .route("/shorten", post(shorten_handler))
        .layer(cors::layer());

    Router::new()
        .route("/{code}", get(redirect_handler))
        .route("/health", get(health_handler))
        .merge(shorten_router)
        .nest("/api", api::routes::link_routes())
        .with_state(state)
        .layer(tracing::layer())
}

/// [`build_router`] wrapped in trailing-slash normalization.
pub fn app_router(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state))
}
