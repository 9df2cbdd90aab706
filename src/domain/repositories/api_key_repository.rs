//! Repository trait for API key authentication.

use crate::domain::entities::ApiKey;
use crate::error::AppError;
use async_trait::async_trait;

/// Repository interface for API key management.
///
/// Keys are looked up by their HMAC hash; the raw key never reaches storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// Finds a non-revoked key by hash.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn find_active_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, AppError>;

    /// Records that a key was just used.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn touch_last_used(&self, id: i64) -> Result<(), AppError>;

    /// Stores a new key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if the hash or name is already stored.
    /// Returns [`AppError::Internal`] on store errors.
    async fn create(&self, name: &str, key_hash: &str) -> Result<ApiKey, AppError>;

    /// Lists all keys, revoked ones included.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn list(&self) -> Result<Vec<ApiKey>, AppError>;

    /// Finds a key by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn find_by_id(&self, id: i64) -> Result<Option<ApiKey>, AppError>;

    /// Finds a key by name.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    async fn find_by_name(&self, name: &str) -> Result<Option<ApiKey>, AppError>;

    /// Revokes a key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the key does not exist.
    /// Returns [`AppError::Internal`] on store errors.
    async fn revoke(&self, id: i64) -> Result<(), AppError>;
}
