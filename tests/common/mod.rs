#![allow(dead_code)]

use axum_test::TestServer;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use linkdrop::application::services::{AliasService, AllocationPolicy, AuthService};
use linkdrop::domain::entities::{AliasRecord, NewAlias};
use linkdrop::domain::repositories::AliasRepository;
use linkdrop::infrastructure::cache::NullCache;
use linkdrop::infrastructure::persistence::{MemoryAliasRepository, MemoryApiKeyRepository};
use linkdrop::routes::build_router;
use linkdrop::state::{AppState, HttpSettings};

pub const BASE_URL: &str = "https://sho.rt";
pub const HOME_URL: &str = "https://sho.rt/home";
pub const API_KEY_SECRET: &str = "test-signing-secret";

/// A server over the in-memory stores plus handles for seeding them.
pub struct TestApp {
    pub server: TestServer,
    pub aliases: Arc<MemoryAliasRepository>,
    pub auth: Arc<AuthService>,
}

pub fn create_test_app() -> TestApp {
    create_test_app_with(AllocationPolicy::default(), false)
}

pub fn create_test_app_with(policy: AllocationPolicy, require_api_key: bool) -> TestApp {
    let aliases = Arc::new(MemoryAliasRepository::new());
    let api_keys = Arc::new(MemoryApiKeyRepository::new());
    let cache = Arc::new(NullCache::new());

    let alias_service = Arc::new(AliasService::new(aliases.clone(), cache.clone(), policy));
    let auth = Arc::new(AuthService::new(api_keys, API_KEY_SECRET.to_string()));

    let state = AppState::new(
        alias_service,
        auth.clone(),
        cache,
        HttpSettings {
            public_base_url: BASE_URL.to_string(),
            home_url: HOME_URL.to_string(),
            require_api_key,
        },
    );

    let server = TestServer::new(build_router(state)).unwrap();

    TestApp {
        server,
        aliases,
        auth,
    }
}

pub async fn insert_alias(
    repo: &MemoryAliasRepository,
    code: &str,
    target_url: &str,
    owner_id: &str,
    expires_at: Option<DateTime<Utc>>,
) -> AliasRecord {
    repo.create(NewAlias {
        code: code.to_string(),
        target_url: target_url.to_string(),
        owner_id: owner_id.to_string(),
        created_at: Utc::now(),
        expires_at,
    })
    .await
    .unwrap()
}
