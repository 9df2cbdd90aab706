//! Business logic services for the application layer.

pub mod alias_service;
pub mod auth_service;

pub use alias_service::{AliasService, AllocationPolicy, ExpiryStrategy, OwnerListing};
pub use auth_service::AuthService;
