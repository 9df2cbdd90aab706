//! Authentication service for third-party API keys.

use hmac::{Hmac, Mac};
use rand::Rng;
use sha2::Sha256;
use std::sync::Arc;

use crate::domain::entities::ApiKey;
use crate::domain::repositories::ApiKeyRepository;
use crate::error::AppError;
use serde_json::json;

type HmacSha256 = Hmac<Sha256>;

const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const KEY_LENGTH: usize = 48;

/// Service for authenticating `x-api-key` requests and issuing keys.
///
/// Keys are hashed with HMAC-SHA256 (keyed by `signing_secret`) before storage
/// and comparison. An attacker with read-only access to the database cannot verify
/// or forge keys without the server-side secret.
pub struct AuthService {
    repository: Arc<dyn ApiKeyRepository>,
    signing_secret: String,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `repository` - API key repository
    /// - `signing_secret` - HMAC key; must match the value used when keys were issued
    pub fn new(repository: Arc<dyn ApiKeyRepository>, signing_secret: String) -> Self {
        Self {
            repository,
            signing_secret,
        }
    }

    /// Hashes a raw key with HMAC-SHA256 using the server signing secret.
    ///
    /// Returns a 64-character lowercase hex-encoded MAC.
    pub fn hash_key(&self, raw_key: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.signing_secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(raw_key.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Authenticates a raw key against stored credentials.
    ///
    /// On success, updates the key's `last_used_at`; a failure to do so is
    /// ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Unauthorized`] if the key is empty, unknown or revoked.
    /// Returns [`AppError::Internal`] on store errors.
    pub async fn authenticate(&self, raw_key: &str) -> Result<ApiKey, AppError> {
        let raw_key = raw_key.trim();
        if raw_key.is_empty() {
            return Err(invalid_key());
        }

        let key = self
            .repository
            .find_active_by_hash(&self.hash_key(raw_key))
            .await?
            .ok_or_else(invalid_key)?;

        let _ = self.repository.touch_last_used(key.id).await;

        Ok(key)
    }

    /// Issues a new key under `name`.
    ///
    /// Returns the stored record and the raw key. The raw key is not
    /// recoverable afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] if `name` is blank or already used.
    /// Returns [`AppError::Internal`] on store errors.
    pub async fn issue_key(&self, name: &str) -> Result<(ApiKey, String), AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::bad_request(
                "API key name must not be empty",
                json!({}),
            ));
        }

        let raw_key = generate_raw_key();
        let key = self.repository.create(name, &self.hash_key(&raw_key)).await?;

        Ok((key, raw_key))
    }

    /// Lists every key, revoked ones included.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on store errors.
    pub async fn list_keys(&self) -> Result<Vec<ApiKey>, AppError> {
        self.repository.list().await
    }

    /// Revokes the key with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no such key exists.
    /// Returns [`AppError::Internal`] on store errors.
    pub async fn revoke_key(&self, id: i64) -> Result<ApiKey, AppError> {
        self.repository.revoke(id).await?;
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("API key not found", json!({ "id": id })))
    }
}

fn generate_raw_key() -> String {
    let mut rng = rand::rng();
    (0..KEY_LENGTH)
        .map(|_| KEY_ALPHABET[rng.random_range(0..KEY_ALPHABET.len())] as char)
        .collect()
}

fn invalid_key() -> AppError {
    AppError::unauthorized("Invalid API key", json!({ "reason": "Unknown or revoked key" }))
}
