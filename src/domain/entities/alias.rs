//! Alias entity: a short code mapped to a target URL under an owner.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted short-code → target URL mapping.
///
/// `expires_at` is `None` for deployments running the non-expiring variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasRecord {
    pub id: i64,
    pub code: String,
    pub target_url: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl AliasRecord {
    /// Creates a new AliasRecord instance.
    pub fn new(
        id: i64,
        code: String,
        target_url: String,
        owner_id: String,
        created_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            code,
            target_url,
            owner_id,
            created_at,
            expires_at,
        }
    }

    /// Returns true if the record has expired at `now`.
    ///
    /// A record is expired from the instant `now >= expires_at`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|e| now >= e)
    }

    /// Returns true if the record has passed its expiry time.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Input data for inserting a new alias.
#[derive(Debug, Clone)]
pub struct NewAlias {
    pub code: String,
    pub target_url: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// What a successful resolution yields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub target_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}
