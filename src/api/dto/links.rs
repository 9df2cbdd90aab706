//! DTOs for first-party link management.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::application::services::OwnerListing;
use crate::domain::entities::AliasRecord;

/// A stored link as returned to its owner.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkDto {
    pub id: i64,
    pub code: String,
    pub short_url: String,
    pub target_url: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl LinkDto {
    pub fn from_record(record: AliasRecord, short_url: String) -> Self {
        Self {
            id: record.id,
            code: record.code,
            short_url,
            target_url: record.target_url,
            created_at: record.created_at,
            expires_at: record.expires_at,
        }
    }
}

/// Response of `GET /api/links`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkListResponse {
    pub items: Vec<LinkDto>,
    pub count: usize,
    pub quota: i64,
    pub remaining: i64,
    pub has_custom_code: bool,
}

impl LinkListResponse {
    pub fn from_listing(listing: OwnerListing, short_url: impl Fn(&str) -> String) -> Self {
        let count = listing.count();
        let remaining = listing.remaining();

        Self {
            count,
            quota: listing.quota,
            remaining,
            has_custom_code: listing.has_custom_code,
            items: listing
                .items
                .into_iter()
                .map(|r| {
                    let url = short_url(&r.code);
                    LinkDto::from_record(r, url)
                })
                .collect(),
        }
    }
}
