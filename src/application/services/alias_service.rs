//! Short-code allocation, resolution, listing and deletion.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use serde_json::json;
use tracing::{debug, info, warn};

use crate::domain::entities::{AliasRecord, NewAlias, ResolvedTarget, is_api_owner};
use crate::domain::repositories::AliasRepository;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheService, ttl_for};
use crate::utils::code_generator::{CodeGenerator, validate_custom_code};
use crate::utils::url_validator::{UrlValidationError, validate_target_url};

/// When expired records are physically removed.
///
/// Both strategies hide expired records from resolution and listing; they
/// only differ in whether listing also deletes them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExpiryStrategy {
    /// Delete on resolution only; listing filters.
    #[default]
    Lazy,
    /// Additionally delete the owner's expired records before each listing.
    Eager,
}

impl FromStr for ExpiryStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lazy" => Ok(Self::Lazy),
            "eager" => Ok(Self::Eager),
            other => Err(format!("unknown expiry strategy '{other}'")),
        }
    }
}

impl fmt::Display for ExpiryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lazy => f.write_str("lazy"),
            Self::Eager => f.write_str("eager"),
        }
    }
}

/// Tunables for allocation and expiry.
#[derive(Debug, Clone)]
pub struct AllocationPolicy {
    pub generator: CodeGenerator,
    /// Maximum concurrently valid records per owner.
    pub quota_per_owner: i64,
    /// Calendar months a record lives. `0` disables expiry.
    pub retention_months: u32,
    /// Insert attempts for generated codes before giving up.
    pub generation_attempts: usize,
    /// Accept `-` and `_` in custom codes.
    pub allow_code_punctuation: bool,
    pub expiry_strategy: ExpiryStrategy,
}

impl Default for AllocationPolicy {
    fn default() -> Self {
        Self {
            generator: CodeGenerator::default(),
            quota_per_owner: 11,
            retention_months: 1,
            generation_attempts: 5,
            allow_code_punctuation: false,
            expiry_strategy: ExpiryStrategy::Lazy,
        }
    }
}

impl AllocationPolicy {
    /// Expiry for a record created at `created_at`, or `None` when records never expire.
    pub fn expires_at(&self, created_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.retention_months == 0 {
            return None;
        }
        created_at.checked_add_months(Months::new(self.retention_months))
    }
}

/// An owner's valid records plus the derived quota view.
#[derive(Debug, Clone)]
pub struct OwnerListing {
    /// Newest first, at most `quota` entries.
    pub items: Vec<AliasRecord>,
    pub quota: i64,
    /// Whether any listed code has a length the generator never produces.
    pub has_custom_code: bool,
}

impl OwnerListing {
    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn remaining(&self) -> i64 {
        (self.quota - self.items.len() as i64).max(0)
    }
}

/// Service owning every rule about short codes.
///
/// Holds no locks: the store's atomic insert is the only collision arbiter,
/// and the custom-code pre-check exists solely to fail fast.
pub struct AliasService {
    repository: Arc<dyn AliasRepository>,
    cache: Arc<dyn CacheService>,
    policy: AllocationPolicy,
}

impl AliasService {
    pub fn new(
        repository: Arc<dyn AliasRepository>,
        cache: Arc<dyn CacheService>,
        policy: AllocationPolicy,
    ) -> Self {
        Self {
            repository,
            cache,
            policy,
        }
    }

    pub fn policy(&self) -> &AllocationPolicy {
        &self.policy
    }

    /// Allocates a short code for `target_url` under `owner_id`.
    ///
    /// A non-blank `requested_code` takes precedence over generation and is
    /// used verbatim (trimmed). Generated codes are retried on collision up to
    /// [`AllocationPolicy::generation_attempts`]; custom codes never are.
    ///
    /// # Errors
    ///
    /// - [`AppError::InvalidUrl`] if `target_url` is not an absolute http(s) URL
    /// - [`AppError::InvalidCode`] if the custom code breaks alphabet/length rules
    /// - [`AppError::CodeTaken`] if the code is held by a valid record, or
    ///   lost an insert race
    /// - [`AppError::QuotaExceeded`] if a client owner already holds the
    ///   maximum; key-scoped owners (`api_{id}`) are exempt
    /// - [`AppError::Internal`] on store errors
    pub async fn allocate(
        &self,
        target_url: &str,
        requested_code: Option<&str>,
        owner_id: &str,
    ) -> Result<AliasRecord, AppError> {
        let target_url = target_url.trim();
        validate_target_url(target_url).map_err(|e| {
            let message = match e {
                UrlValidationError::Empty => "URL is required",
                _ => "Invalid URL format",
            };
            AppError::invalid_url(message, json!({ "reason": e.to_string() }))
        })?;

        let requested_code = requested_code.map(str::trim).filter(|c| !c.is_empty());

        if let Some(code) = requested_code {
            validate_custom_code(code, self.policy.allow_code_punctuation)?;
            self.ensure_code_available(code).await?;
        }

        let now = Utc::now();
        if !is_api_owner(owner_id) {
            self.ensure_within_quota(owner_id, now).await?;
        }

        let expires_at = self.policy.expires_at(now);
        let build = |code: String| NewAlias {
            code,
            target_url: target_url.to_string(),
            owner_id: owner_id.to_string(),
            created_at: now,
            expires_at,
        };

        let record = match requested_code {
            Some(code) => self.repository.create(build(code.to_string())).await?,
            None => self.insert_generated(build).await?,
        };

        info!(
            code = %record.code,
            owner_id = %record.owner_id,
            custom = requested_code.is_some(),
            "Alias allocated"
        );

        Ok(record)
    }

    /// Resolves `code` to its target.
    ///
    /// An expired record is deleted (best-effort) and reported as absent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the code is absent or expired.
    /// Returns [`AppError::Internal`] on store errors.
    pub async fn resolve(&self, code: &str) -> Result<ResolvedTarget, AppError> {
        let now = Utc::now();

        match self.cache.get_target(code).await {
            Ok(Some(target)) if !target.expires_at.is_some_and(|e| now >= e) => {
                return Ok(target);
            }
            Ok(_) => {}
            Err(e) => warn!(code, error = %e, "Cache lookup failed, falling back to store"),
        }

        let record = self
            .repository
            .find_by_code(code)
            .await?
            .ok_or_else(|| not_found(code))?;

        if record.is_expired_at(now) {
            debug!(code, "Alias expired, deleting");
            if let Err(e) = self.repository.delete(record.id).await {
                warn!(code, error = %e, "Failed to delete expired alias");
            }
            if let Err(e) = self.cache.invalidate(code).await {
                warn!(code, error = %e, "Failed to invalidate cache");
            }
            return Err(not_found(code));
        }

        let target = ResolvedTarget {
            target_url: record.target_url,
            expires_at: record.expires_at,
        };

        if let Some(ttl) = ttl_for(target.expires_at, now) {
            self.fill_cache(code, record.id, &target, ttl).await;
        }

        Ok(target)
    }

    /// Lists the owner's valid records, newest first, capped at the quota.
    ///
    /// Under [`ExpiryStrategy::Eager`] the owner's expired records are deleted
    /// first; a failed delete is logged and the listing still excludes them.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    pub async fn list(&self, owner_id: &str) -> Result<OwnerListing, AppError> {
        let now = Utc::now();

        if self.policy.expiry_strategy == ExpiryStrategy::Eager {
            match self.repository.delete_expired_for_owner(owner_id, now).await {
                Ok(0) => {}
                Ok(n) => debug!(owner_id, deleted = n, "Deleted expired aliases before listing"),
                Err(e) => warn!(owner_id, error = %e, "Failed to delete expired aliases"),
            }
        }

        let items = self
            .repository
            .list_active(owner_id, now, self.policy.quota_per_owner)
            .await?;

        let has_custom_code = items
            .iter()
            .any(|r| !self.policy.generator.is_generated_length(r.code.chars().count()));

        Ok(OwnerListing {
            items,
            quota: self.policy.quota_per_owner,
            has_custom_code,
        })
    }

    /// Deletes the owner's record `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no record `id` belongs to `owner_id`.
    /// Returns [`AppError::Internal`] on store errors.
    pub async fn delete(&self, owner_id: &str, id: i64) -> Result<(), AppError> {
        let code = self
            .repository
            .delete_owned(id, owner_id)
            .await?
            .ok_or_else(|| AppError::not_found("Link not found", json!({ "id": id })))?;

        if let Err(e) = self.cache.invalidate(&code).await {
            warn!(code, error = %e, "Failed to invalidate cache after delete");
        }

        info!(code, owner_id, "Alias deleted");
        Ok(())
    }

    /// Deletes every expired record in the store.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    pub async fn sweep_expired(&self) -> Result<u64, AppError> {
        self.repository.delete_expired(Utc::now()).await
    }

    /// Checks that the store is reachable.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] if the store does not answer.
    pub async fn ping(&self) -> Result<(), AppError> {
        self.repository.ping().await
    }

    async fn ensure_within_quota(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(), AppError> {
        let active = self.repository.count_active(owner_id, now).await?;
        if active >= self.policy.quota_per_owner {
            return Err(AppError::quota_exceeded(
                format!(
                    "Maximum of {} shortened links. Delete some to create more.",
                    self.policy.quota_per_owner
                ),
                json!({ "owner_id": owner_id, "active": active }),
            ));
        }
        Ok(())
    }

    /// Caches the resolution of record `id`, then re-reads the store.
    ///
    /// A delete or reclaim that ran between the lookup and the write has
    /// already invalidated the key, so the entry written here would be stale.
    /// The re-read catches that case and drops the entry again.
    async fn fill_cache(
        &self,
        code: &str,
        id: i64,
        target: &ResolvedTarget,
        ttl: Option<u64>,
    ) {
        if !self.cache.is_enabled() {
            return;
        }

        if let Err(e) = self.cache.set_target(code, target, ttl).await {
            warn!(code, error = %e, "Failed to cache alias");
            return;
        }

        let still_current = matches!(
            self.repository.find_by_code(code).await,
            Ok(Some(ref current)) if current.id == id
        );
        if !still_current {
            debug!(code, "Alias changed while caching, dropping entry");
            if let Err(e) = self.cache.invalidate(code).await {
                warn!(code, error = %e, "Failed to invalidate cache");
            }
        }
    }

    /// Advisory uniqueness check for a custom code.
    ///
    /// A record that has expired but not yet been swept does not block the
    /// code; it is deleted here so the insert can succeed.
    async fn ensure_code_available(&self, code: &str) -> Result<(), AppError> {
        let Some(existing) = self.repository.find_by_code(code).await? else {
            return Ok(());
        };

        if !existing.is_expired() {
            return Err(AppError::code_taken(
                "Custom code already in use",
                json!({ "code": code }),
            ));
        }

        if let Err(e) = self.repository.delete(existing.id).await {
            warn!(code, error = %e, "Failed to reclaim expired code");
        }
        if let Err(e) = self.cache.invalidate(code).await {
            warn!(code, error = %e, "Failed to invalidate cache");
        }

        Ok(())
    }

    async fn insert_generated(
        &self,
        build: impl Fn(String) -> NewAlias,
    ) -> Result<AliasRecord, AppError> {
        let attempts = self.policy.generation_attempts.max(1);

        for attempt in 1..=attempts {
            let code = self.policy.generator.generate();
            match self.repository.create(build(code)).await {
                Ok(record) => return Ok(record),
                Err(AppError::CodeTaken { .. }) => {
                    debug!(attempt, "Generated code collided, retrying");
                }
                Err(e) => return Err(e),
            }
        }

        warn!(attempts, "Failed to generate a unique code");
        Err(AppError::code_taken(
            "Could not allocate a unique short code, please retry",
            json!({ "attempts": attempts }),
        ))
    }
}

fn not_found(code: &str) -> AppError {
    AppError::not_found("Short link not found", json!({ "code": code }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::MockAliasRepository;
    use crate::infrastructure::cache::{MockCacheService, NullCache};
    use crate::utils::code_generator::ALPHABET;
    use chrono::Duration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn record_from(n: NewAlias) -> AliasRecord {
        AliasRecord::new(1, n.code, n.target_url, n.owner_id, n.created_at, n.expires_at)
    }

    fn stored(id: i64, code: &str, expires_at: Option<DateTime<Utc>>) -> AliasRecord {
        AliasRecord::new(
            id,
            code.to_string(),
            "https://example.com/a".to_string(),
            "u1".to_string(),
            Utc::now() - Duration::days(1),
            expires_at,
        )
    }

    fn service(repo: MockAliasRepository) -> AliasService {
        service_with(repo, AllocationPolicy::default())
    }

    fn service_with(repo: MockAliasRepository, policy: AllocationPolicy) -> AliasService {
        AliasService::new(Arc::new(repo), Arc::new(NullCache::new()), policy)
    }

    fn service_with_cache(repo: MockAliasRepository, cache: MockCacheService) -> AliasService {
        AliasService::new(Arc::new(repo), Arc::new(cache), AllocationPolicy::default())
    }

    fn cache_missing() -> MockCacheService {
        let mut cache = MockCacheService::new();
        cache.expect_is_enabled().return_const(true);
        cache.expect_get_target().returning(|_| Ok(None));
        cache
    }

    #[tokio::test]
    async fn test_allocate_generated_code() {
        let mut repo = MockAliasRepository::new();
        repo.expect_count_active().times(1).returning(|_, _| Ok(0));
        repo.expect_create().times(1).returning(|n| Ok(record_from(n)));

        let record = service(repo)
            .allocate("https://example.com/a", None, "u1")
            .await
            .unwrap();

        assert_eq!(record.code.len(), 6);
        assert!(record.code.bytes().all(|b| ALPHABET.contains(&b)));
        assert_eq!(record.target_url, "https://example.com/a");
        assert_eq!(record.owner_id, "u1");

        let expires_at = record.expires_at.expect("expiring variant");
        assert!(expires_at > record.created_at + Duration::days(27));
        assert!(expires_at <= record.created_at + Duration::days(31));
    }

    #[tokio::test]
    async fn test_allocate_without_retention_never_expires() {
        let mut repo = MockAliasRepository::new();
        repo.expect_count_active().returning(|_, _| Ok(0));
        repo.expect_create().returning(|n| Ok(record_from(n)));

        let policy = AllocationPolicy {
            retention_months: 0,
            ..AllocationPolicy::default()
        };
        let record = service_with(repo, policy)
            .allocate("https://example.com", None, "u1")
            .await
            .unwrap();

        assert!(record.expires_at.is_none());
    }

    #[tokio::test]
    async fn test_allocate_invalid_url() {
        let repo = MockAliasRepository::new();

        let err = service(repo)
            .allocate("not a url", None, "u1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidUrl { .. }));
        assert_eq!(err.to_string(), "Invalid URL format");
    }

    #[tokio::test]
    async fn test_allocate_empty_url() {
        let err = service(MockAliasRepository::new())
            .allocate("  ", None, "u1")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "URL is required");
    }

    #[tokio::test]
    async fn test_allocate_custom_code_min_length() {
        let mut repo = MockAliasRepository::new();
        repo.expect_find_by_code()
            .withf(|code| code == "ab")
            .times(1)
            .returning(|_| Ok(None));
        repo.expect_count_active().returning(|_, _| Ok(0));
        repo.expect_create()
            .withf(|n| n.code == "ab")
            .times(1)
            .returning(|n| Ok(record_from(n)));

        let record = service(repo)
            .allocate("https://example.com", Some("ab"), "u1")
            .await
            .unwrap();

        assert_eq!(record.code, "ab");
    }

    #[tokio::test]
    async fn test_allocate_custom_code_too_short() {
        let err = service(MockAliasRepository::new())
            .allocate("https://example.com", Some("a"), "u1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidCode { .. }));
    }

    #[tokio::test]
    async fn test_allocate_blank_custom_code_falls_back_to_generation() {
        let mut repo = MockAliasRepository::new();
        repo.expect_find_by_code().times(0);
        repo.expect_count_active().returning(|_, _| Ok(0));
        repo.expect_create().times(1).returning(|n| Ok(record_from(n)));

        let record = service(repo)
            .allocate("https://example.com", Some("   "), "u1")
            .await
            .unwrap();

        assert_eq!(record.code.len(), 6);
    }

    #[tokio::test]
    async fn test_allocate_custom_code_is_trimmed() {
        let mut repo = MockAliasRepository::new();
        repo.expect_find_by_code().returning(|_| Ok(None));
        repo.expect_count_active().returning(|_, _| Ok(0));
        repo.expect_create().returning(|n| Ok(record_from(n)));

        let record = service(repo)
            .allocate("https://example.com", Some("  promo "), "u1")
            .await
            .unwrap();

        assert_eq!(record.code, "promo");
    }

    #[tokio::test]
    async fn test_allocate_custom_code_taken() {
        let mut repo = MockAliasRepository::new();
        let existing = stored(5, "taken", Some(Utc::now() + Duration::days(3)));
        repo.expect_find_by_code()
            .times(1)
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_create().times(0);

        let err = service(repo)
            .allocate("https://example.com", Some("taken"), "u1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::CodeTaken { .. }));
    }

    #[tokio::test]
    async fn test_allocate_custom_code_held_by_expired_record_is_reclaimed() {
        let mut repo = MockAliasRepository::new();
        let existing = stored(5, "stale", Some(Utc::now() - Duration::seconds(1)));
        repo.expect_find_by_code()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_delete()
            .withf(|id| *id == 5)
            .times(1)
            .returning(|_| Ok(true));
        repo.expect_count_active().returning(|_, _| Ok(0));
        repo.expect_create().times(1).returning(|n| Ok(record_from(n)));

        let record = service(repo)
            .allocate("https://example.com", Some("stale"), "u2")
            .await
            .unwrap();

        assert_eq!(record.code, "stale");
    }

    #[tokio::test]
    async fn test_allocate_custom_code_insert_race_is_not_retried() {
        let mut repo = MockAliasRepository::new();
        repo.expect_find_by_code().returning(|_| Ok(None));
        repo.expect_count_active().returning(|_, _| Ok(0));
        repo.expect_create().times(1).returning(|n| {
            Err(AppError::code_taken(
                "Custom code already in use",
                json!({ "code": n.code }),
            ))
        });

        let err = service(repo)
            .allocate("https://example.com", Some("racy"), "u1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::CodeTaken { .. }));
    }

    #[tokio::test]
    async fn test_allocate_generated_code_retries_on_collision() {
        let mut repo = MockAliasRepository::new();
        repo.expect_count_active().returning(|_, _| Ok(0));

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        repo.expect_create().times(3).returning(move |n| {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(AppError::code_taken("taken", json!({})))
            } else {
                Ok(record_from(n))
            }
        });

        let result = service(repo)
            .allocate("https://example.com", None, "u1")
            .await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_allocate_generated_code_gives_up_after_attempts() {
        let mut repo = MockAliasRepository::new();
        repo.expect_count_active().returning(|_, _| Ok(0));
        repo.expect_create()
            .times(5)
            .returning(|_| Err(AppError::code_taken("taken", json!({}))));

        let err = service(repo)
            .allocate("https://example.com", None, "u1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::CodeTaken { .. }));
    }

    #[tokio::test]
    async fn test_allocate_quota_exceeded() {
        let mut repo = MockAliasRepository::new();
        repo.expect_count_active()
            .withf(|owner, _| owner == "u1")
            .returning(|_, _| Ok(11));
        repo.expect_create().times(0);

        let err = service(repo)
            .allocate("https://example.com", None, "u1")
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::QuotaExceeded { .. }));
        assert!(err.to_string().contains("Maximum of 11"));
    }

    #[tokio::test]
    async fn test_allocate_api_key_owner_is_not_metered() {
        let mut repo = MockAliasRepository::new();
        repo.expect_count_active().times(0);
        repo.expect_create()
            .withf(|n| n.owner_id == "api_7")
            .times(1)
            .returning(|n| Ok(record_from(n)));

        let record = service(repo)
            .allocate("https://example.com", None, "api_7")
            .await
            .unwrap();

        assert_eq!(record.owner_id, "api_7");
    }

    #[tokio::test]
    async fn test_allocate_store_failure_is_internal() {
        let mut repo = MockAliasRepository::new();
        repo.expect_count_active()
            .returning(|_, _| Err(AppError::internal("db down", json!({}))));

        let err = service(repo)
            .allocate("https://example.com", None, "u1")
            .await
            .unwrap_err();

        assert!(err.is_retriable());
    }

    #[tokio::test]
    async fn test_resolve_valid() {
        let mut repo = MockAliasRepository::new();
        let expires_at = Some(Utc::now() + Duration::days(10));
        let existing = stored(1, "abc123", expires_at);
        repo.expect_find_by_code()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_delete().times(0);

        let target = service(repo).resolve("abc123").await.unwrap();

        assert_eq!(target.target_url, "https://example.com/a");
        assert_eq!(target.expires_at, expires_at);
    }

    #[tokio::test]
    async fn test_resolve_unknown_code() {
        let mut repo = MockAliasRepository::new();
        repo.expect_find_by_code().returning(|_| Ok(None));

        let err = service(repo).resolve("nope").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_expired_deletes_and_reports_not_found() {
        let mut repo = MockAliasRepository::new();
        let existing = stored(9, "old", Some(Utc::now() - Duration::minutes(1)));
        repo.expect_find_by_code()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_delete()
            .withf(|id| *id == 9)
            .times(1)
            .returning(|_| Ok(true));

        let err = service(repo).resolve("old").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_expired_delete_failure_is_not_fatal() {
        let mut repo = MockAliasRepository::new();
        let existing = stored(9, "old", Some(Utc::now() - Duration::minutes(1)));
        repo.expect_find_by_code()
            .returning(move |_| Ok(Some(existing.clone())));
        repo.expect_delete()
            .returning(|_| Err(AppError::internal("db down", json!({}))));

        let err = service(repo).resolve("old").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_resolve_fills_cache() {
        let mut repo = MockAliasRepository::new();
        let existing = stored(1, "abc123", Some(Utc::now() + Duration::days(10)));
        repo.expect_find_by_code()
            .times(2)
            .returning(move |_| Ok(Some(existing.clone())));

        let mut cache = cache_missing();
        cache
            .expect_set_target()
            .withf(|code, target, ttl| {
                code == "abc123" && target.target_url == "https://example.com/a" && ttl.is_some()
            })
            .times(1)
            .returning(|_, _, _| Ok(()));
        cache.expect_invalidate().times(0);

        let target = service_with_cache(repo, cache).resolve("abc123").await.unwrap();
        assert_eq!(target.target_url, "https://example.com/a");
    }

    #[tokio::test]
    async fn test_resolve_drops_cache_entry_when_alias_deleted_meanwhile() {
        let mut repo = MockAliasRepository::new();
        let existing = stored(1, "abc123", None);
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        repo.expect_find_by_code().times(2).returning(move |_| {
            if counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Ok(Some(existing.clone()))
            } else {
                Ok(None)
            }
        });

        let mut cache = cache_missing();
        cache.expect_set_target().times(1).returning(|_, _, _| Ok(()));
        cache
            .expect_invalidate()
            .withf(|code| code == "abc123")
            .times(1)
            .returning(|_| Ok(()));

        let result = service_with_cache(repo, cache).resolve("abc123").await;

        assert!(result.is_ok());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_resolve_drops_cache_entry_when_code_reclaimed_meanwhile() {
        let mut repo = MockAliasRepository::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        repo.expect_find_by_code().times(2).returning(move |_| {
            let id = if counter.fetch_add(1, Ordering::SeqCst) == 0 { 1 } else { 2 };
            Ok(Some(stored(id, "promo", None)))
        });

        let mut cache = cache_missing();
        cache.expect_set_target().times(1).returning(|_, _, _| Ok(()));
        cache.expect_invalidate().times(1).returning(|_| Ok(()));

        assert!(service_with_cache(repo, cache).resolve("promo").await.is_ok());
    }

    #[tokio::test]
    async fn test_resolve_cache_hit_skips_store() {
        let mut repo = MockAliasRepository::new();
        repo.expect_find_by_code().times(0);

        let mut cache = MockCacheService::new();
        cache.expect_get_target().returning(|_| {
            Ok(Some(ResolvedTarget {
                target_url: "https://example.com/cached".to_string(),
                expires_at: None,
            }))
        });

        let target = service_with_cache(repo, cache).resolve("abc123").await.unwrap();
        assert_eq!(target.target_url, "https://example.com/cached");
    }

    #[tokio::test]
    async fn test_list_lazy_does_not_delete() {
        let mut repo = MockAliasRepository::new();
        repo.expect_delete_expired_for_owner().times(0);
        repo.expect_list_active()
            .withf(|owner, _, limit| owner == "u1" && *limit == 11)
            .returning(|_, _, _| Ok(vec![stored(1, "abcdef", None)]));

        let listing = service(repo).list("u1").await.unwrap();

        assert_eq!(listing.count(), 1);
        assert_eq!(listing.remaining(), 10);
        assert!(!listing.has_custom_code);
    }

    #[tokio::test]
    async fn test_list_eager_deletes_expired_first() {
        let mut repo = MockAliasRepository::new();
        repo.expect_delete_expired_for_owner()
            .withf(|owner, _| owner == "u1")
            .times(1)
            .returning(|_, _| Ok(2));
        repo.expect_list_active()
            .returning(|_, _, _| Ok(vec![stored(1, "abcdef", None), stored(2, "ab", None)]));

        let policy = AllocationPolicy {
            expiry_strategy: ExpiryStrategy::Eager,
            ..AllocationPolicy::default()
        };
        let listing = service_with(repo, policy).list("u1").await.unwrap();

        assert_eq!(listing.count(), 2);
        assert!(listing.has_custom_code);
    }

    #[tokio::test]
    async fn test_delete_not_owned() {
        let mut repo = MockAliasRepository::new();
        repo.expect_delete_owned().returning(|_, _| Ok(None));

        let err = service(repo).delete("u2", 1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_owned() {
        let mut repo = MockAliasRepository::new();
        repo.expect_delete_owned()
            .withf(|id, owner| *id == 1 && owner == "u1")
            .times(1)
            .returning(|_, _| Ok(Some("abc123".to_string())));

        assert!(service(repo).delete("u1", 1).await.is_ok());
    }

    #[test]
    fn test_expiry_strategy_parse() {
        assert_eq!("lazy".parse::<ExpiryStrategy>(), Ok(ExpiryStrategy::Lazy));
        assert_eq!("EAGER".parse::<ExpiryStrategy>(), Ok(ExpiryStrategy::Eager));
        assert!("sometimes".parse::<ExpiryStrategy>().is_err());
    }
}
