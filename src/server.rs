//! HTTP server initialization and runtime setup.
//!
//! Handles store selection, cache setup, the expiry sweeper, and the Axum
//! server lifecycle.

use crate::application::services::{AliasService, AuthService};
use crate::config::{Config, StoreBackend};
use crate::domain::expiry_sweeper::run_expiry_sweeper;
use crate::domain::repositories::{AliasRepository, ApiKeyRepository};
use crate::infrastructure::cache::{CacheService, NullCache, RedisCache};
use crate::infrastructure::persistence::{
    MemoryAliasRepository, MemoryApiKeyRepository, PgAliasRepository, PgApiKeyRepository,
};
use crate::routes::app_router;
use crate::state::{AppState, HttpSettings};

use anyhow::{Context, Result};
use axum::ServiceExt;
use axum::extract::Request;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Alias and API key stores for the configured backend.
pub struct Stores {
    pub aliases: Arc<dyn AliasRepository>,
    pub api_keys: Arc<dyn ApiKeyRepository>,
}

/// Opens a Postgres pool with the configured limits.
///
/// # Errors
///
/// Returns an error if the URL is missing or the connection fails.
pub async fn connect_pool(config: &Config) -> Result<PgPool> {
    let database_url = config
        .database_url
        .as_deref()
        .context("DATABASE_URL is not configured")?;

    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(config.db_connect_timeout))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout))
        .max_lifetime(Duration::from_secs(config.db_max_lifetime))
        .connect(database_url)
        .await
        .context("Failed to connect to database")
}

/// Builds the stores for `config.store_backend`, running migrations for Postgres.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn open_stores(config: &Config) -> Result<Stores> {
    match config.store_backend {
        StoreBackend::Postgres => {
            let pool = connect_pool(config).await?;
            tracing::info!("Connected to database");

            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .context("Failed to run migrations")?;

            let pool = Arc::new(pool);
            Ok(Stores {
                aliases: Arc::new(PgAliasRepository::new(pool.clone())),
                api_keys: Arc::new(PgApiKeyRepository::new(pool)),
            })
        }
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Stores {
                aliases: Arc::new(MemoryAliasRepository::new()),
                api_keys: Arc::new(MemoryApiKeyRepository::new()),
            })
        }
    }
}

async fn connect_cache(config: &Config) -> Arc<dyn CacheService> {
    let Some(redis_url) = &config.redis_url else {
        tracing::info!("Cache disabled (NullCache)");
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(redis_url, config.cache_ttl_seconds).await {
        Ok(redis) => {
            tracing::info!("Cache enabled (Redis)");
            Arc::new(redis)
        }
        Err(e) => {
            tracing::warn!("Failed to connect to Redis: {}. Using NullCache.", e);
            Arc::new(NullCache::new())
        }
    }
}

/// Runs the HTTP server with the given configuration.
///
/// Initializes:
/// - Alias store (Postgres with migrations, or in-memory)
/// - Redis cache (or NullCache fallback)
/// - Background expiry sweeper (unless `SWEEP_INTERVAL_SECONDS=0`)
/// - Axum HTTP server with graceful shutdown on Ctrl+C
///
/// # Errors
///
/// Returns an error if:
/// - Database connection or migration fails
/// - Server bind fails
/// - Server runtime error occurs
pub async fn run(config: Config) -> Result<()> {
    let stores = open_stores(&config).await?;
    let cache = connect_cache(&config).await;

    let alias_service = Arc::new(AliasService::new(
        stores.aliases.clone(),
        cache.clone(),
        config.allocation_policy(),
    ));
    let auth_service = Arc::new(AuthService::new(
        stores.api_keys,
        config.api_key_secret.clone(),
    ));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let sweeper = (config.sweep_interval_seconds > 0).then(|| {
        tokio::spawn(run_expiry_sweeper(
            stores.aliases.clone(),
            Duration::from_secs(config.sweep_interval_seconds),
            shutdown_rx,
        ))
    });
    if sweeper.is_none() {
        tracing::info!("Expiry sweeper disabled");
    }

    let state = AppState::new(
        alias_service,
        auth_service,
        cache,
        HttpSettings::from_config(&config),
    );

    let app = app_router(state);

    let addr: SocketAddr = config
        .listen_addr
        .parse()
        .with_context(|| format!("Invalid LISTEN address '{}'", config.listen_addr))?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Listening on http://{addr}");

    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    let _ = shutdown_tx.send(true);
    if let Some(handle) = sweeper {
        let _ = handle.await;
    }

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
