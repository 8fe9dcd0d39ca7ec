//! Persisted refresh and password-reset tokens
//!
//! The signed JWTs carry the row id as `jti`; these tables decide whether a
//! well-signed token is still usable.

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RefreshTokenRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
    pub replaced_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl RefreshTokenRecord {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PasswordResetRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl PasswordResetRecord {
    pub fn is_usable(&self, now: DateTime<Utc>) -> bool {
        self.used_at.is_none() && self.expires_at > now
    }
}

pub struct RefreshTokenRepository;

impl RefreshTokenRepository {
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<RefreshTokenRecord> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            INSERT INTO refresh_tokens (user_id, expires_at)
            VALUES ($1, $2)
            RETURNING id, user_id, expires_at, revoked_at, replaced_by, created_at
            "#,
        )
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<RefreshTokenRecord>> {
        let record = sqlx::query_as::<_, RefreshTokenRecord>(
            r#"
            SELECT id, user_id, expires_at, revoked_at, replaced_by, created_at
            FROM refresh_tokens
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Revoke one token; returns false when it was already revoked.
    /// Of two concurrent calls for the same id only one sees `true`.
    pub async fn revoke(pool: &PgPool, id: Uuid, replaced_by: Option<Uuid>) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = NOW(), replaced_by = $2
            WHERE id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(id)
        .bind(replaced_by)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Revoke every active token of a user, returns how many
    pub async fn revoke_all_for_user(pool: &PgPool, user_id: Uuid) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked_at = NOW()
            WHERE user_id = $1 AND revoked_at IS NULL
            "#,
        )
        .bind(user_id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}

pub struct PasswordResetRepository;

impl PasswordResetRepository {
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> Result<PasswordResetRecord> {
        let record = sqlx::query_as::<_, PasswordResetRecord>(
            r#"
            INSERT INTO password_reset_tokens (user_id, expires_at)
            VALUES ($1, $2)
            RETURNING id, user_id, expires_at, used_at, created_at
            "#,
        )
        .bind(user_id)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

        Ok(record)
    }

    pub async fn find(pool: &PgPool, id: Uuid) -> Result<Option<PasswordResetRecord>> {
        let record = sqlx::query_as::<_, PasswordResetRecord>(
            r#"
            SELECT id, user_id, expires_at, used_at, created_at
            FROM password_reset_tokens
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(record)
    }

    /// Mark used; false when another request used it first
    pub async fn mark_used(pool: &PgPool, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE password_reset_tokens SET used_at = NOW() WHERE id = $1 AND used_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
