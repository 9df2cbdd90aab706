//! Shared application state injected into every handler.

use std::sync::Arc;

use crate::application::services::{AliasService, AuthService};
use crate::config::Config;
use crate::infrastructure::cache::CacheService;

/// Request-facing settings that are not part of the allocation policy.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    /// Base for `shortUrl` when the request carries no `Origin` header.
    pub public_base_url: String,
    /// Where the redirect endpoint sends unknown or expired codes.
    pub home_url: String,
    /// Reject `POST /shorten` requests without a valid `x-api-key`.
    pub require_api_key: bool,
}

impl HttpSettings {
    pub fn from_config(config: &Config) -> Self {
        Self {
            public_base_url: config.public_base_url.clone(),
            home_url: config.home_url.clone(),
            require_api_key: config.require_api_key,
        }
    }
}

/// Cheap to clone: every field is reference-counted.
#[derive(Clone)]
pub struct AppState {
    pub alias_service: Arc<AliasService>,
    pub auth_service: Arc<AuthService>,
    pub cache: Arc<dyn CacheService>,
    pub settings: Arc<HttpSettings>,
}

impl AppState {
    pub fn new(
        alias_service: Arc<AliasService>,
        auth_service: Arc<AuthService>,
        cache: Arc<dyn CacheService>,
        settings: HttpSettings,
    ) -> Self {
        Self {
            alias_service,
            auth_service,
            cache,
            settings: Arc::new(settings),
        }
    }

    /// Builds the absolute short URL for `code`.
    ///
    /// `origin` (the request's `Origin` header) wins over the configured base.
    pub fn short_url(&self, origin: Option<&str>, code: &str) -> String {
        let base = origin
            .map(str::trim)
            .filter(|o| !o.is_empty() && *o != "null")
            .unwrap_or(&self.settings.public_base_url);

        format!("{}/{}", base.trim_end_matches('/'), code)
    }
}
