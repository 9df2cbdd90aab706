//! PostgreSQL implementation of the alias store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;

use crate::domain::entities::{AliasRecord, NewAlias};
use crate::domain::repositories::AliasRepository;
use crate::error::AppError;

/// PostgreSQL repository for aliases.
///
/// Uniqueness is enforced by the `aliases_code_key` constraint; a violating
/// insert surfaces as [`AppError::CodeTaken`].
pub struct PgAliasRepository {
    pool: Arc<PgPool>,
}

impl PgAliasRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AliasRow {
    id: i64,
    code: String,
    target_url: String,
    owner_id: String,
    created_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl From<AliasRow> for AliasRecord {
    fn from(r: AliasRow) -> Self {
        AliasRecord::new(
            r.id,
            r.code,
            r.target_url,
            r.owner_id,
            r.created_at,
            r.expires_at,
        )
    }
}

#[async_trait]
impl AliasRepository for PgAliasRepository {
    async fn create(&self, new_alias: NewAlias) -> Result<AliasRecord, AppError> {
        let result = sqlx::query_as::<_, AliasRow>(
            r#"
            INSERT INTO aliases (code, target_url, owner_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, code, target_url, owner_id, created_at, expires_at
            "#,
        )
        .bind(&new_alias.code)
        .bind(&new_alias.target_url)
        .bind(&new_alias.owner_id)
        .bind(new_alias.created_at)
        .bind(new_alias.expires_at)
        .fetch_one(self.pool.as_ref())
        .await;

        match result {
            Ok(row) => Ok(row.into()),
            Err(e)
                if e
                    .as_database_error()
                    .is_some_and(|db| db.constraint() == Some("aliases_code_key")) =>
            {
                Err(AppError::code_taken(
                    "Custom code already in use",
                    json!({ "code": new_alias.code }),
                ))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_code(&self, code: &str) -> Result<Option<AliasRecord>, AppError> {
        let row = sqlx::query_as::<_, AliasRow>(
            r#"
            SELECT id, code, target_url, owner_id, created_at, expires_at
            FROM aliases
            WHERE code = $1
            "#,
        )
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(Into::into))
    }

    async fn delete(&self, id: i64) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM aliases WHERE id = $1")
            .bind(id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_owned(&self, id: i64, owner_id: &str) -> Result<Option<String>, AppError> {
        let code = sqlx::query_scalar::<_, String>(
            "DELETE FROM aliases WHERE id = $1 AND owner_id = $2 RETURNING code",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(code)
    }

    async fn count_active(&self, owner_id: &str, now: DateTime<Utc>) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM aliases
            WHERE owner_id = $1
              AND (expires_at IS NULL OR expires_at > $2)
            "#,
        )
        .bind(owner_id)
        .bind(now)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn list_active(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<AliasRecord>, AppError> {
        let rows = sqlx::query_as::<_, AliasRow>(
            r#"
            SELECT id, code, target_url, owner_id, created_at, expires_at
            FROM aliases
            WHERE owner_id = $1
              AND (expires_at IS NULL OR expires_at > $2)
            ORDER BY created_at DESC, id DESC
            LIMIT $3
            "#,
        )
        .bind(owner_id)
        .bind(now)
        .bind(limit)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_expired_for_owner(
        &self,
        owner_id: &str,
        now: DateTime<Utc>,
    ) -> Result<u64, AppError> {
        let result =
            sqlx::query("DELETE FROM aliases WHERE owner_id = $1 AND expires_at <= $2")
                .bind(owner_id)
                .bind(now)
                .execute(self.pool.as_ref())
                .await?;

        Ok(result.rows_affected())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM aliases WHERE expires_at <= $1")
            .bind(now)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}
