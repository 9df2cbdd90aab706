//! DTOs for link shortening endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /shorten` and `POST /api/links`.
///
/// `url` is optional at the serde level so that a missing field yields
/// "URL is required" rather than a deserialization error.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ShortenRequest {
    #[validate(length(max = 2048, message = "URL is too long"))]
    pub url: Option<String>,

    /// Preferred short code; blank means "generate one".
    pub custom_code: Option<String>,
}

/// Successful `POST /shorten` response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortenResponse {
    pub short_url: String,
    pub short_code: String,
    pub original_url: String,
    pub expires_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_uses_camel_case() {
        let req: ShortenRequest =
            serde_json::from_value(json!({ "url": "https://a.io", "customCode": "promo" }))
                .unwrap();

        assert_eq!(req.custom_code.as_deref(), Some("promo"));
        assert!(req.validate().is_ok());
    }

    #[test]
    fn test_missing_url_deserializes() {
        let req: ShortenRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.url.is_none());
    }

    #[test]
    fn test_overlong_url_fails_validation() {
        let req = ShortenRequest {
            url: Some(format!("https://example.com/{}", "a".repeat(2048))),
            custom_code: None,
        };

        assert!(req.validate().is_err());
    }

    #[test]
    fn test_response_shape() {
        let body = serde_json::to_value(ShortenResponse {
            short_url: "https://sho.rt/abc123".to_string(),
            short_code: "abc123".to_string(),
            original_url: "https://example.com".to_string(),
            expires_at: None,
        })
        .unwrap();

        assert_eq!(
            body,
            json!({
                "shortUrl": "https://sho.rt/abc123",
                "shortCode": "abc123",
                "originalUrl": "https://example.com",
                "expiresAt": null
            })
        );
    }
}
