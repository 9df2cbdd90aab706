//! In-process alias store.
//!
//! Holds every record behind a single `RwLock`; the check-and-insert in
//! [`AliasRepository::create`] runs under the write lock, which gives the same
//! atomic uniqueness guarantee as the Postgres unique constraint. Data does
//! not survive a restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::domain::entities::{AliasRecord, NewAlias};
use crate::domain::repositories::AliasRepository;
use crate::error::AppError;

#[derive(Default)]
struct Inner {
    next_id: i64,
    records: BTreeMap<i64, AliasRecord>,
    by_code: HashMap<String, i64>,
}

impl Inner {
    fn remove(&mut self, id: i64) -> Option<AliasRecord> {
        let record = self.records.remove(&id)?;
        self.by_code.remove(&record.code);
        Some(record)
    }

    fn remove_where(&mut self, pred: impl Fn(&AliasRecord) -> bool) -> u64 {
        let ids: Vec<i64> = self
            .records
            .values()
            .filter(|r| pred(r))
            .map(|r| r.id)
            .collect();

        for id in &ids {
            self.remove(*id);
        }

        ids.len() as u64
    }
}

/// Alias store kept in memory.
#[derive(Default)]
pub struct MemoryAliasRepository {
    inner: RwLock<Inner>,
}

impl MemoryAliasRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AliasRepository for MemoryAliasRepository {
    async fn create(&self, new_alias: NewAlias) -> Result<AliasRecord, AppError> {
        let mut inner = self.inner.write().await;

        if inner.by_code.contains_key(&new_alias.code) {
            return Err(AppError::code_taken(
                "Custom code already in use",
                json!({ "code": new_alias.code }),
            ));
        }

        inner.next_id += 1;
        let record = AliasRecord::new(
            inner.next_id,
            new_alias.code,
            new_alias.target_url,
            new_alias.owner_id,
            new_alias.created_at,
            new_alias.expires_at,
        );

        inner.by_code.insert(record.code.clone(), record.id);
        inner.records.insert(record.id, record.clone());

        Ok(record)
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<AliasRecord>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .by_code
            .get(code)
            .and_then(|id| inner.records.get(id))
            .cloned())
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        Ok(self.inner.write().await.remove(id).is_some())
    }

    async fn delete_owned(&self, id: i64, owner_id: &str) -> Result<Option<String>, AppError> {
        let mut inner = self.inner.write().await;

        let owned = inner
            .records
            .get(&id)
            .is_some_and(|r| r.owner_id == owner_id);
        if !owned {
            return Ok(None);
        }

        Ok(inner.remove(id).map(|r| r.code))
    }

    async fn count_active(&self, owner_id: &str, now: DateTime<Utc>) -> Result<i64, AppError> {
        let inner = self.inner.read().await;
        let count = inner
            .records
            .values()
            .filter(|r| r.owner_id == owner_id && !r.is_expired_at(now))
            .count();

        Ok(count as i64)
    }

    async fn list_active(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<AliasRecord>, AppError> {
        let inner = self.inner.read().await;

        let mut records: Vec<AliasRecord> = inner
            .records
            .values()
            .filter(|r| r.owner_id == owner_id && !r.is_expired_at(now))
            .cloned()
            .collect();

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        records.truncate(usize::try_from(limit).unwrap_or(0));

        Ok(records)
    }

    async fn delete_expired_for_owner(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let mut inner = self.inner.write().await;
        Ok(inner.remove_where(|r| r.owner_id == owner_id && r.is_expired_at(now)))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let mut inner = self.inner.write().await;
        Ok(inner.remove_where(|r| r.is_expired_at(now)))
    }

    async fn ping(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use std::sync::Arc;

    fn new_alias(code: &str, owner: &str, expires_at: Option<DateTime<Utc>>) -> NewAlias {
        NewAlias {
            code: code.to_string(),
            target_url: format!("https://example.com/{code}"),
            owner_id: owner.to_string(),
            created_at: Utc::now(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let repo = MemoryAliasRepository::new();
        let created = repo.create(new_alias("abc123", "u1", None)).await.unwrap();

        let found = repo.find_by_code("abc123").await.unwrap().unwrap();
        assert_eq!(found, created);
        assert!(repo.find_by_code("ABC123").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_is_rejected() {
        let repo = MemoryAliasRepository::new();
        repo.create(new_alias("dup", "u1", None)).await.unwrap();

        let err = repo.create(new_alias("dup", "u2", None)).await.unwrap_err();
        assert!(matches!(err, AppError::CodeTaken { .. }));
    }

    #[tokio::test]
    async fn test_concurrent_same_code_only_one_wins() {
        let repo = Arc::new(MemoryAliasRepository::new());

        let handles: Vec<_> = (0..16)
            .map(|i| {
                let repo = repo.clone();
                tokio::spawn(async move {
                    repo.create(new_alias("race", &format!("u{i}"), None)).await
                })
            })
            .collect();

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                wins += 1;
            }
        }

        assert_eq!(wins, 1);
    }

    #[tokio::test]
    async fn test_delete_owned_checks_owner() {
        let repo = MemoryAliasRepository::new();
        let record = repo.create(new_alias("mine", "u1", None)).await.unwrap();

        assert_eq!(repo.delete_owned(record.id, "u2").await.unwrap(), None);
        assert_eq!(
            repo.delete_owned(record.id, "u1").await.unwrap(),
            Some("mine".to_string())
        );
        assert!(repo.find_by_code("mine").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_active_hides_expired_and_orders_newest_first() {
        let repo = MemoryAliasRepository::new();
        let now = Utc::now();

        repo.create(NewAlias {
            created_at: now - Duration::minutes(2),
            ..new_alias("old", "u1", None)
        })
        .await
        .unwrap();
        repo.create(NewAlias {
            created_at: now - Duration::minutes(1),
            ..new_alias("new", "u1", None)
        })
        .await
        .unwrap();
        repo.create(new_alias("gone", "u1", Some(now - Duration::seconds(1))))
            .await
            .unwrap();
        repo.create(new_alias("other", "u2", None)).await.unwrap();

        let listed = repo.list_active("u1", now, 11).await.unwrap();
        let codes: Vec<_> = listed.iter().map(|r| r.code.as_str()).collect();
        assert_eq!(codes, vec!["new", "old"]);
        assert_eq!(repo.count_active("u1", now).await.unwrap(), 2);

        let capped = repo.list_active("u1", now, 1).await.unwrap();
        assert_eq!(capped.len(), 1);
    }

    #[tokio::test]
    async fn test_delete_expired_frees_code() {
        let repo = MemoryAliasRepository::new();
        let now = Utc::now();
        repo.create(new_alias("stale", "u1", Some(now - Duration::seconds(1))))
            .await
            .unwrap();
        repo.create(new_alias("fresh", "u2", Some(now + Duration::days(1))))
            .await
            .unwrap();

        assert_eq!(repo.delete_expired_for_owner("u2", now).await.unwrap(), 0);
        assert_eq!(repo.delete_expired(now).await.unwrap(), 1);
        assert!(repo.create(new_alias("stale", "u3", None)).await.is_ok());
    }
}
