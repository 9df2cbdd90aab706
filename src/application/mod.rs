//! Application layer services implementing business logic.
//!
//! Services consume repository traits and provide the API used by HTTP
//! handlers, the background sweeper and the admin CLI.
//!
//! - [`services::alias_service::AliasService`] - Allocation, resolution, listing, deletion
//! - [`services::auth_service::AuthService`] - API key hashing, issuing and verification

pub mod services;
