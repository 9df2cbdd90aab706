//! Store implementations.
//!
//! - [`PgAliasRepository`] / [`PgApiKeyRepository`] - PostgreSQL via SQLx
//! - [`MemoryAliasRepository`] / [`MemoryApiKeyRepository`] - in-process, for
//!   development and tests

pub mod memory_alias_repository;
pub mod memory_api_key_repository;
pub mod pg_alias_repository;
pub mod pg_api_key_repository;

pub use memory_alias_repository::MemoryAliasRepository;
pub use memory_api_key_repository::MemoryApiKeyRepository;
pub use pg_alias_repository::PgAliasRepository;
pub use pg_api_key_repository::PgApiKeyRepository;
