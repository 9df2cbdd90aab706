//! Repository trait for the alias store.

use crate::domain::entities::{AliasRecord, NewAlias};
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The alias store: single source of truth for existence, ownership and
/// expiration of short codes.
///
/// Implementations must enforce code uniqueness atomically in [`create`];
/// that is the only collision arbiter the service relies on.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgAliasRepository`] - PostgreSQL
/// - [`crate::infrastructure::persistence::MemoryAliasRepository`] - in-process
/// - Test mocks available with `cfg(test)`
///
/// [`create`]: AliasRepository::create
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AliasRepository: Send + Sync {
    /// Inserts a new alias.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::CodeTaken`] if a record with the same code already
    /// exists, including one inserted concurrently.
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn create(&self, new_alias: NewAlias) -> Result<AliasRecord, AppError>;

    /// Finds a record by code regardless of expiry.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn find_by_code(&self, code: &str) -> Result<Option<AliasRecord>, AppError>;

    /// Deletes a record by id. Returns `Ok(false)` if it was already gone.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn delete(&self, id: i64) -> Result<bool, AppError>;

    /// Deletes a record by id only if it belongs to `owner_id`.
    ///
    /// Returns the deleted record's code, or `None` if no such record is owned.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn delete_owned(&self, id: i64, owner_id: &str) -> Result<Option<String>, AppError>;

    /// Counts the owner's records that are still valid at `now`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn count_active(&self, owner_id: &str, now: DateTime<Utc>) -> Result<i64, AppError>;

    /// Lists the owner's records valid at `now`, newest first, at most `limit`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn list_active(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<AliasRecord>, AppError>;

    /// Deletes the owner's records expired at `now`. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn delete_expired_for_owner(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError>;

    /// Deletes every record expired at `now`. Returns the number removed.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError>;

    /// Round-trips to the store. Used by the health check.
    async fn ping(&self) -> Result<(), AppError>;
}
