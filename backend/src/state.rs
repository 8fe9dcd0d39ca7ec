//! Application state management
//!
//! Shared state passed to every handler via Axum's state extraction.
//! Everything expensive (JWT keys, pool, HTTP clients) is built once at
//! startup and all fields are cheap to clone.

use crate::auth::{JwtService, TokenLifetimes};
use crate::cache::CatalogCache;
use crate::config::AppConfig;
use crate::services::email::EmailService;
use crate::services::storage::{storage_from_config, FileStorage};
use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Pre-initialized JWT service with cached keys
    pub jwt: JwtService,
    /// Reference data cache
    pub cache: CatalogCache,
    pub email: EmailService,
    pub storage: Arc<dyn FileStorage>,
    /// Renders `/metrics`; absent when no recorder was installed
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Build the state from configuration
    ///
    /// Fails when the configured email or storage provider is unknown.
    pub fn new(db: PgPool, config: AppConfig, metrics: Option<PrometheusHandle>) -> Result<Self> {
        let jwt = JwtService::new(
            &config.jwt.secret,
            TokenLifetimes {
                access_secs: config.jwt.access_token_expiry_secs,
                refresh_secs: config.jwt.refresh_token_expiry_secs,
                reset_secs: config.jwt.reset_token_expiry_secs,
            },
        );
        let cache = CatalogCache::new(
            config.cache.max_capacity,
            Duration::from_secs(config.cache.ttl_secs),
        );
        let email = EmailService::from_config(&config.email)?;
        let storage = storage_from_config(&config.storage)?;

        Ok(Self {
            db,
            config: Arc::new(config),
            jwt,
            cache,
            email,
            storage,
            metrics,
        })
    }

    /// Get a reference to the database pool
    #[inline]
    pub fn db(&self) -> &PgPool {
        &self.db
    }

    /// Get a reference to the configuration
    #[inline]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Get a reference to the JWT service
    #[inline]
    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }
}
