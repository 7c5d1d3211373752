use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::info;
use uuid::Uuid;

use crate::{cms::CmsClient, config::AppConfig, storage::S3Storage};

#[derive(Clone)]
pub struct AppState {
    pool: PgPool,
    storage: S3Storage,
    cms: CmsClient,
    config: Arc<AppConfig>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(&config.database_url)
            .await
            .context("failed to connect to Postgres")?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("failed to run database migrations")?;

        let storage = S3Storage::from_config(&config.storage).await;
        let cms = CmsClient::new(&config.cms).context("failed to initialize CMS client")?;

        Ok(Self::from_parts(pool, storage, cms, config))
    }

    pub fn from_parts(pool: PgPool, storage: S3Storage, cms: CmsClient, config: AppConfig) -> Self {
        Self {
            pool,
            storage,
            cms,
            config: Arc::new(config),
        }
    }

    /// Creates the configured staff account when the users table is empty.
    pub async fn ensure_seed_staff(&self) -> Result<()> {
        let has_user: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users)")
            .fetch_one(&self.pool)
            .await
            .context("failed to verify staff presence")?;

        if !has_user {
            let seed = &self.config.seed_staff;
            let password_hash = crate::web::auth::hash_password(&seed.password)
                .map_err(|err| anyhow!("failed to hash seed staff password: {err}"))?;

            sqlx::query("INSERT INTO users (id, username, password_hash) VALUES ($1, $2, $3)")
                .bind(Uuid::new_v4())
                .bind(&seed.username)
                .bind(password_hash)
                .execute(&self.pool)
                .await
                .context("failed to insert seed staff user")?;

            info!(
                username = %seed.username,
                "Seeded default staff account. Change its password promptly."
            );
        }

        Ok(())
    }

    pub fn pool_ref(&self) -> &PgPool {
        &self.pool
    }

    pub fn storage(&self) -> &S3Storage {
        &self.storage
    }

    pub fn cms(&self) -> &CmsClient {
        &self.cms
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
