//! Shared application state

use std::sync::Arc;
use std::time::Duration;

use aws_sdk_sesv2::Client as SesClient;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use crate::BoxError;
use crate::auth::{JwtConfig, JwtService, RateLimiter};
use crate::config::Config;
use crate::db::refresh_tokens;
use crate::media::MediaStore;
use crate::notify::Notifier;

/// Period of the background sweep
const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    pub config: Arc<Config>,
    /// Access token issuer/validator
    pub jwt: JwtService,
    /// Uploaded photo storage
    pub media: MediaStore,
    /// Office registration emails
    pub notifier: Notifier,
    /// Rate limiter for login/registration routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Connect, run migrations and build clients
    pub async fn new(config: Config) -> Result<Self, BoxError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(10))
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");

        let notifier = if config.ses_from_email.is_some() && !config.notify_emails.is_empty() {
            let aws_config = aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await;
            Notifier::new(
                Some(SesClient::new(&aws_config)),
                config.ses_from_email.clone(),
                config.notify_emails.clone(),
                config.verification_url.clone(),
            )
        } else {
            tracing::info!("SES_FROM_EMAIL or NOTIFY_EMAILS unset, registration emails disabled");
            Notifier::disabled()
        };

        Ok(Self::with_pool(pool, config, notifier))
    }

    /// Build state around an existing pool (no migrations, no network clients)
    pub fn with_pool(pool: PgPool, config: Config, notifier: Notifier) -> Self {
        let jwt = JwtService::with_config(JwtConfig::from(&config));
        let media = MediaStore::new(
            config.media_root.clone(),
            config.media_url.clone(),
            config.max_upload_bytes,
        );
        Self {
            pool,
            config: Arc::new(config),
            jwt,
            media,
            notifier,
            rate_limiter: RateLimiter::new(),
        }
    }
}

impl AppState {
    /// Spawn the periodic sweep task
    pub fn spawn_maintenance(&self) -> tokio::task::JoinHandle<()> {
        let state = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(SWEEP_INTERVAL);
            loop {
                interval.tick().await;
                state.sweep().await;
            }
        })
    }

    /// Drop stale rate-limit entries and dead refresh tokens
    pub async fn sweep(&self) {
        self.rate_limiter.cleanup().await;
        match refresh_tokens::purge_stale(&self.pool).await {
            Ok(0) => {}
            Ok(removed) => tracing::debug!(removed, "Purged stale refresh tokens"),
            Err(e) => tracing::warn!("Refresh token purge failed: {e:?}"),
        }
    }
}
