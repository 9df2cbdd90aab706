//! API route configuration.
//!
//! Every route here is scoped by the `X-Owner-Id` header, enforced per
//! handler by [`crate::api::middleware::owner::OwnerId`].

use crate::api::handlers::{create_link_handler, delete_link_handler, list_links_handler};
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get},
};

/// First-party link management routes, nested under `/api`.
///
/// # Endpoints
///
/// - `GET    /links`        - List the owner's valid links and quota
/// - `POST   /links`        - Create a link for the owner
/// - `DELETE /links/{id}`   - Delete one of the owner's links
pub fn link_routes() -> Router<AppState> {
    Router::new()
        .route("/links", get(list_links_handler).post(create_link_handler))
        .route("/links/{id}", delete(delete_link_handler))
}
