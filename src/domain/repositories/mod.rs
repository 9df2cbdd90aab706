//! Repository trait definitions for the domain layer.
//!
//! Traits define the contract for data operations; implementations live in
//! `crate::infrastructure::persistence`. Mock implementations are generated via
//! `mockall` for unit tests.
//!
//! - [`AliasRepository`] - The alias store
//! - [`ApiKeyRepository`] - API key lookup and management

pub mod alias_repository;
pub mod api_key_repository;

pub use alias_repository::AliasRepository;
pub use api_key_repository::ApiKeyRepository;

#[cfg(test)]
pub use alias_repository::MockAliasRepository;
#[cfg(test)]
pub use api_key_repository::MockApiKeyRepository;
