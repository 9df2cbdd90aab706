//! In-process API key store.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::RwLock;

use crate::domain::entities::ApiKey;
use crate::domain::repositories::ApiKeyRepository;
use crate::error::AppError;

/// API key store kept in memory. Used with the in-memory alias store.
#[derive(Default)]
pub struct MemoryApiKeyRepository {
    keys: RwLock<Vec<ApiKey>>,
}

impl MemoryApiKeyRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ApiKeyRepository for MemoryApiKeyRepository {
    async fn find_active_by_hash(&self, key_hash: &str) -> Result<Option<ApiKey>, AppError> {
        let keys = self.keys.read().await;
        Ok(keys
            .iter()
            .find(|k| k.key_hash == key_hash && !k.is_revoked())
            .cloned())
    }

    async fn touch_last_used(&self, id: i64) -> Result<(), AppError> {
        let mut keys = self.keys.write().await;
        if let Some(key) = keys.iter_mut().find(|k| k.id == id) {
            key.last_used_at = Some(Utc::now());
        }
        Ok(())
    }

    async fn create(&self, name: &str, key_hash: &str) -> Result<ApiKey, AppError> {
        let mut keys = self.keys.write().await;

        if keys.iter().any(|k| k.name == name || k.key_hash == key_hash) {
            return Err(AppError::bad_request(
                "An API key with this name or value already exists",
                json!({ "name": name }),
            ));
        }

        let key = ApiKey {
            id: keys.len() as i64 + 1,
            name: name.to_string(),
            key_hash: key_hash.to_string(),
            created_at: Utc::now(),
            last_used_at: None,
            revoked_at: None,
        };
        keys.push(key.clone());

        Ok(key)
    }

    async fn list(&self) -> Result<Vec<ApiKey>, AppError> {
        Ok(self.keys.read().await.clone())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<ApiKey>, AppError> {
        Ok(self.keys.read().await.iter().find(|k| k.id == id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<ApiKey>, AppError> {
        Ok(self
            .keys
            .read()
            .await
            .iter()
            .find(|k| k.name == name)
            .cloned())
    }

    async fn revoke(&self, id: i64) -> Result<(), AppError> {
        let mut keys = self.keys.write().await;
        let key = keys
            .iter_mut()
            .find(|k| k.id == id)
            .ok_or_else(|| AppError::not_found("API key not found", json!({ "id": id })))?;

        key.revoked_at.get_or_insert_with(Utc::now);
        Ok(())
    }
}
