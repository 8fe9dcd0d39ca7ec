//! Refresh token lifecycle
//!
//! Each refresh JWT is backed by a `refresh_tokens` row whose id is the
//! token's `jti`. Refreshing rotates the row; presenting a rotated token a
//! second time revokes every session of that user.

use crate::auth::JwtService;
use crate::error::ApiError;
use crate::repositories::{RefreshTokenRepository, UserRepository};
use chrono::{Duration, Utc};
use fittrack_shared::models::Role;
use fittrack_shared::types::AuthTokens;
use sqlx::PgPool;
use tracing::{debug, warn};
use uuid::Uuid;

pub struct TokenService;

impl TokenService {
    /// Persist a refresh token row and sign a new token pair
    pub async fn issue_tokens(
        pool: &PgPool,
        jwt: &JwtService,
        user_id: Uuid,
        role: Role,
    ) -> Result<AuthTokens, ApiError> {
        let expires_at = Utc::now() + Duration::seconds(jwt.refresh_token_expiry_secs());
        let row = RefreshTokenRepository::create(pool, user_id, expires_at)
            .await
            .map_err(ApiError::Internal)?;

        Self::sign_pair(jwt, user_id, role, row.id)
    }

    fn sign_pair(jwt: &JwtService, user_id: Uuid, role: Role, jti: Uuid) -> Result<AuthTokens, ApiError> {
        let access_token = jwt
            .generate_access_token(user_id, role)
            .map_err(ApiError::Internal)?;
        let refresh_token = jwt
            .generate_refresh_token(user_id, jti)
            .map_err(ApiError::Internal)?;

        Ok(AuthTokens {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: jwt.access_token_expiry_secs(),
        })
    }

    /// Exchange a refresh token for a new pair
    pub async fn rotate(
        pool: &PgPool,
        jwt: &JwtService,
        refresh_token: &str,
    ) -> Result<AuthTokens, ApiError> {
        let invalid = || ApiError::Unauthorized("Invalid refresh token".to_string());

        let claims = jwt.validate_refresh_token(refresh_token).map_err(|_| invalid())?;
        let token_id = claims.token_id().map_err(|_| invalid())?;

        let row = RefreshTokenRepository::find(pool, token_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(invalid)?;

        if row.revoked_at.is_some() {
            Self::handle_reuse(pool, row.user_id, token_id).await?;
            return Err(invalid());
        }
        if !row.is_active(Utc::now()) {
            return Err(invalid());
        }

        let user = UserRepository::find_by_id(pool, row.user_id)
            .await
            .map_err(ApiError::Internal)?
            .ok_or_else(invalid)?;
        let role = user.role.parse::<Role>().map_err(|e| ApiError::Internal(anyhow::anyhow!(e)))?;

        let expires_at = Utc::now() + Duration::seconds(jwt.refresh_token_expiry_secs());
        let next = RefreshTokenRepository::create(pool, user.id, expires_at)
            .await
            .map_err(ApiError::Internal)?;

        let revoked = RefreshTokenRepository::revoke(pool, token_id, Some(next.id))
            .await
            .map_err(ApiError::Internal)?;
        if !revoked {
            // Lost a race with another rotation of the same token
            Self::handle_reuse(pool, user.id, token_id).await?;
            return Err(invalid());
        }

        debug!(user_id = %user.id, "refresh token rotated");
        Self::sign_pair(jwt, user.id, role, next.id)
    }

    async fn handle_reuse(pool: &PgPool, user_id: Uuid, token_id: Uuid) -> Result<(), ApiError> {
        let revoked = RefreshTokenRepository::revoke_all_for_user(pool, user_id)
            .await
            .map_err(ApiError::Internal)?;
        warn!(
            user_id = %user_id,
            token_id = %token_id,
            revoked,
            "revoked refresh token reused, all sessions revoked"
        );
        Ok(())
    }

    /// Revoke one refresh token (logout); revoking twice is not an error
    pub async fn revoke(pool: &PgPool, jwt: &JwtService, refresh_token: &str) -> Result<(), ApiError> {
        let claims = jwt
            .validate_refresh_token(refresh_token)
            .map_err(|_| ApiError::Unauthorized("Invalid refresh token".to_string()))?;
        let token_id = claims
            .token_id()
            .map_err(|_| ApiError::Unauthorized("Invalid refresh token".to_string()))?;

        RefreshTokenRepository::revoke(pool, token_id, None)
            .await
            .map_err(ApiError::Internal)?;
        Ok(())
    }

    /// Revoke every session of a user
    pub async fn revoke_all(pool: &PgPool, user_id: Uuid) -> Result<u64, ApiError> {
        RefreshTokenRepository::revoke_all_for_user(pool, user_id)
            .await
            .map_err(ApiError::Internal)
    }
}
