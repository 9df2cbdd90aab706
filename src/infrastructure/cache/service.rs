//! Cache service trait and error types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::entities::ResolvedTarget;

/// Errors that can occur during cache operations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),

    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Trait for caching resolved short codes.
///
/// A cached entry must never outlive the record's `expires_at`; callers pass
/// a TTL computed with [`ttl_for`]. Cache failures degrade to store lookups.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis-backed cache with TTL support
/// - [`crate::infrastructure::cache::NullCache`] - No-op implementation for disabled caching
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Retrieves the resolution of a short code.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(target))` on cache hit
    /// - `Ok(None)` on cache miss
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] if the backend is unreachable; callers fall back
    /// to the store.
    async fn get_target(&self, code: &str) -> CacheResult<Option<ResolvedTarget>>;

    /// Stores the resolution of a short code for `ttl_seconds`.
    ///
    /// `None` uses the implementation's default TTL.
    ///
    /// # Errors
    ///
    /// Should not propagate errors to callers.
    async fn set_target(
        &self,
        code: &str,
        target: &ResolvedTarget,
        ttl_seconds: Option<u64>,
    ) -> CacheResult<()>;

    /// Removes a cached entry. Used when a record is deleted.
    ///
    /// # Errors
    ///
    /// Should not propagate errors to callers.
    async fn invalidate(&self, code: &str) -> CacheResult<()>;

    /// Checks if the cache backend is healthy.
    async fn health_check(&self) -> bool;

    /// Whether entries are actually stored. `false` lets callers skip work
    /// that only matters for a real cache.
    fn is_enabled(&self) -> bool {
        true
    }
}

/// Computes the TTL for caching a record expiring at `expires_at`.
///
/// Returns `Some(None)` for non-expiring records (use the default TTL),
/// `Some(Some(secs))` for the remaining whole seconds, and `None` when less
/// than a second remains and the entry should not be cached at all.
pub fn ttl_for(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Option<Option<u64>> {
    match expires_at {
        None => Some(None),
        Some(at) => {
            let remaining = (at - now).num_seconds();
            (remaining >= 1).then_some(Some(remaining as u64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_ttl_for_non_expiring_uses_default() {
        assert_eq!(ttl_for(None, Utc::now()), Some(None));
    }

    #[test]
    fn test_ttl_for_is_capped_by_remaining_lifetime() {
        let now = Utc::now();
        assert_eq!(
            ttl_for(Some(now + Duration::seconds(90)), now),
            Some(Some(90))
        );
    }

    #[test]
    fn test_ttl_for_skips_nearly_expired() {
        let now = Utc::now();
        assert_eq!(ttl_for(Some(now + Duration::milliseconds(500)), now), None);
        assert_eq!(ttl_for(Some(now - Duration::seconds(5)), now), None);
    }
}
