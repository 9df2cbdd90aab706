//! API key entity for the credentialed shorten API.

use chrono::{DateTime, Utc};

/// Prefix of owners synthesized from API keys; clients may not claim it.
pub const API_OWNER_PREFIX: &str = "api_";

/// Whether `owner_id` was synthesized from an API key.
///
/// Key-scoped owners are not subject to the per-owner quota.
pub fn is_api_owner(owner_id: &str) -> bool {
    owner_id.starts_with(API_OWNER_PREFIX)
}

/// API key with metadata.
///
/// Only an HMAC of the raw key is stored.
#[derive(Debug, Clone)]
pub struct ApiKey {
    pub id: i64,
    pub name: String,
    pub key_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Owner identifier under which records created with this key are scoped.
    pub fn owner_id(&self) -> String {
        format!("{API_OWNER_PREFIX}{}", self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_owner_id_is_synthetic() {
        let key = ApiKey {
            id: 7,
            name: "widget".to_string(),
            key_hash: "deadbeef".to_string(),
            created_at: Utc::now(),
            last_used_at: None,
            revoked_at: None,
        };

        assert_eq!(key.owner_id(), "api_7");
        assert!(is_api_owner(&key.owner_id()));
        assert!(!key.is_revoked());
    }

    #[test]
    fn test_client_owner_is_not_api_owner() {
        assert!(!is_api_owner("browser-1"));
        assert!(!is_api_owner("apiary"));
    }
}
