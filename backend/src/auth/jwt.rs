//! JWT token generation and validation
//!
//! Access, refresh and password-reset tokens share one HS256 key pair,
//! computed once at startup. The `token_type` claim keeps them apart.

use anyhow::Result;
use chrono::{Duration, Utc};
use fittrack_shared::models::Role;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

pub const ACCESS_TOKEN: &str = "access";
pub const REFRESH_TOKEN: &str = "refresh";
pub const RESET_TOKEN: &str = "reset";

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Token type: "access", "refresh" or "reset"
    pub token_type: String,
    /// Present on access tokens
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    /// Row id of the persisted refresh or reset token
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| anyhow::anyhow!("Invalid user ID in token"))
    }

    pub fn token_id(&self) -> Result<Uuid> {
        self.jti
            .as_deref()
            .and_then(|jti| Uuid::parse_str(jti).ok())
            .ok_or_else(|| anyhow::anyhow!("Token has no valid jti"))
    }
}

/// Pre-computed JWT keys, wrapped in Arc for cheap cloning
#[derive(Clone)]
pub struct JwtKeys {
    encoding: Arc<EncodingKey>,
    decoding: Arc<DecodingKey>,
}

impl JwtKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: Arc::new(EncodingKey::from_secret(secret.as_bytes())),
            decoding: Arc::new(DecodingKey::from_secret(secret.as_bytes())),
        }
    }
}

/// Token lifetimes in seconds
#[derive(Debug, Clone)]
pub struct TokenLifetimes {
    pub access_secs: i64,
    pub refresh_secs: i64,
    pub reset_secs: i64,
}

/// JWT service for token operations
///
/// Create once at startup and keep in `AppState`.
#[derive(Clone)]
pub struct JwtService {
    keys: JwtKeys,
    lifetimes: TokenLifetimes,
}

impl JwtService {
    pub fn new(secret: &str, lifetimes: TokenLifetimes) -> Self {
        Self {
            keys: JwtKeys::new(secret),
            lifetimes,
        }
    }

    /// Generate an access token carrying the user's role
    #[inline]
    pub fn generate_access_token(&self, user_id: Uuid, role: Role) -> Result<String> {
        self.generate_token(user_id, ACCESS_TOKEN, self.lifetimes.access_secs, Some(role), None)
    }

    /// Generate a refresh token bound to a `refresh_tokens` row
    #[inline]
    pub fn generate_refresh_token(&self, user_id: Uuid, jti: Uuid) -> Result<String> {
        self.generate_token(user_id, REFRESH_TOKEN, self.lifetimes.refresh_secs, None, Some(jti))
    }

    /// Generate a password reset token bound to a `password_reset_tokens` row
    #[inline]
    pub fn generate_reset_token(&self, user_id: Uuid, jti: Uuid) -> Result<String> {
        self.generate_token(user_id, RESET_TOKEN, self.lifetimes.reset_secs, None, Some(jti))
    }

    fn generate_token(
        &self,
        user_id: Uuid,
        token_type: &str,
        expiry_secs: i64,
        role: Option<Role>,
        jti: Option<Uuid>,
    ) -> Result<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(expiry_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
            token_type: token_type.to_string(),
            role,
            jti: jti.map(|id| id.to_string()),
        };

        encode(&Header::default(), &claims, &self.keys.encoding)
            .map_err(|e| anyhow::anyhow!("Failed to generate {} token: {}", token_type, e))
    }

    /// Validate signature and expiry, return claims
    #[inline]
    pub fn validate_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.keys.decoding, &Validation::default())
            .map_err(|e| anyhow::anyhow!("Invalid token: {}", e))?;

        Ok(token_data.claims)
    }

    fn validate_typed(&self, token: &str, expected: &str) -> Result<Claims> {
        let claims = self.validate_token(token)?;
        if claims.token_type != expected {
            return Err(anyhow::anyhow!("Expected a {} token", expected));
        }
        Ok(claims)
    }

    #[inline]
    pub fn validate_access_token(&self, token: &str) -> Result<Claims> {
        self.validate_typed(token, ACCESS_TOKEN)
    }

    #[inline]
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        self.validate_typed(token, REFRESH_TOKEN)
    }

    #[inline]
    pub fn validate_reset_token(&self, token: &str) -> Result<Claims> {
        self.validate_typed(token, RESET_TOKEN)
    }

    #[inline]
    pub fn access_token_expiry_secs(&self) -> i64 {
        self.lifetimes.access_secs
    }

    #[inline]
    pub fn refresh_token_expiry_secs(&self) -> i64 {
        self.lifetimes.refresh_secs
    }

    #[inline]
    pub fn reset_token_expiry_secs(&self) -> i64 {
        self.lifetimes.reset_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_service() -> JwtService {
        JwtService::new(
            "test-secret",
            TokenLifetimes {
                access_secs: 3600,
                refresh_secs: 604800,
                reset_secs: 900,
            },
        )
    }

    #[test]
    fn test_generate_and_validate_access_token() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let token = service.generate_access_token(user_id, Role::Admin).unwrap();
        let claims = service.validate_access_token(&token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user_id);
        assert_eq!(claims.token_type, "access");
        assert_eq!(claims.role, Some(Role::Admin));
        assert!(claims.jti.is_none());
    }

    #[test]
    fn test_refresh_token_carries_jti() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();
        let jti = Uuid::new_v4();

        let token = service.generate_refresh_token(user_id, jti).unwrap();
        let claims = service.validate_refresh_token(&token).unwrap();

        assert_eq!(claims.token_id().unwrap(), jti);
        assert!(claims.role.is_none());
    }

    #[test]
    fn test_token_types_are_not_interchangeable() {
        let service = create_test_service();
        let user_id = Uuid::new_v4();

        let access = service.generate_access_token(user_id, Role::User).unwrap();
        let reset = service.generate_reset_token(user_id, Uuid::new_v4()).unwrap();

        assert!(service.validate_refresh_token(&access).is_err());
        assert!(service.validate_reset_token(&access).is_err());
        assert!(service.validate_access_token(&reset).is_err());
        assert!(service.validate_reset_token(&reset).is_ok());
    }

    #[test]
    fn test_invalid_token_rejected() {
        let service = create_test_service();
        assert!(service.validate_token("invalid.token.here").is_err());
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let service = create_test_service();
        let other = JwtService::new(
            "another-secret",
            TokenLifetimes {
                access_secs: 3600,
                refresh_secs: 3600,
                reset_secs: 3600,
            },
        );
        let token = other.generate_access_token(Uuid::new_v4(), Role::User).unwrap();
        assert!(service.validate_access_token(&token).is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = JwtService::new(
            "test-secret",
            TokenLifetimes {
                access_secs: -3600,
                refresh_secs: 3600,
                reset_secs: 3600,
            },
        );
        let token = service.generate_access_token(Uuid::new_v4(), Role::User).unwrap();
        assert!(service.validate_access_token(&token).is_err());
    }
}
