//! Core domain entities.
//!
//! - [`AliasRecord`] - A persisted short link
//! - [`NewAlias`] - Input for inserting a short link
//! - [`ResolvedTarget`] - Result of resolving a code
//! - [`ApiKey`] - A stored (hashed) API credential

pub mod alias;
pub mod api_key;

pub use alias::{AliasRecord, NewAlias, ResolvedTarget};
pub use api_key::{API_OWNER_PREFIX, ApiKey, is_api_owner};
