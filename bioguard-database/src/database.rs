use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use crate::cache::CacheService;

/// Schema for `group_settings`, `bio_warnings`, `bot_users` and `bot_groups`.
pub static MIGRATOR: Migrator = sqlx::migrate!();

/// PostgreSQL store for group settings, warning counters and the broadcast
/// registry.
///
/// Only settings reads go through `settings_cache`. Warning counters are
/// always read and written in SQL so increments and resets stay atomic
/// across bot instances.
#[derive(Clone, Debug)]
pub struct Database {
    pool: PgPool,
    settings_cache: CacheService,
}

impl Database {
    pub async fn connect(
        database_url: &str,
        max_connections: u32,
        settings_cache: CacheService,
    ) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections.max(1))
            .connect(database_url)
            .await?;

        Ok(Self::from_pool(pool, settings_cache))
    }

    pub fn from_pool(pool: PgPool, settings_cache: CacheService) -> Self {
        Self {
            pool,
            settings_cache,
        }
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        MIGRATOR.run(&self.pool).await?;
        Ok(())
    }

    pub(crate) fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub(crate) fn settings_cache(&self) -> &CacheService {
        &self.settings_cache
    }
}
