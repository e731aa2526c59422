mod config;
mod events;

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashSet;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;

use bioguard_commands::Command;
use bioguard_core::{Data, RecentMessages, RetryPolicy, TelegramPlatform};
use bioguard_database::{BotStore, CacheService, Database, MemoryStore};
use bioguard_utils::{LinkDetector, SlidingWindowThrottle};

use crate::config::BotConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(|metadata| {
        let target = metadata.target();

        let within_info_level = *metadata.level() <= tracing::Level::INFO;
        if !within_info_level {
            return false;
        }

        !target.starts_with("teloxide::update_listeners")
    }));

    tracing_subscriber::registry().with(fmt_layer).init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    // Load the .env file
    dotenvy::dotenv().ok();

    let config = BotConfig::from_env()?;

    let store = connect_store(&config).await?;

    let bot = Bot::new(&config.token);
    let me = bot.get_me().await?;
    let bot_username = me.user.username.clone().unwrap_or_default();

    if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(?err, "Failed to register bot commands.");
    }

    let retry = RetryPolicy::default().with_max_attempts(config.api_retry_attempts);
    let throttle = Arc::new(SlidingWindowThrottle::new(
        config.bio_check_window,
        config.bio_check_max_hits,
    ));
    info!(
        bio_check_window_seconds = throttle.window().as_secs(),
        bio_check_max_hits = throttle.max_hits(),
        "Bio check throttle configured."
    );

    let data = Arc::new(Data {
        store,
        platform: Arc::new(TelegramPlatform::new(bot.clone(), retry)),
        detector: LinkDetector::new(config.link_match_case_insensitive),
        throttle: throttle.clone(),
        recent: Arc::new(RecentMessages::new(config.recent_message_scan)),
        delete_notices: Arc::new(DashSet::new()),
        owner_id: config.owner_id,
        support_url: config.support_url.clone(),
        bot_id: me.user.id,
        bot_username,
    });

    if throttle.is_enabled() {
        let window = throttle.window();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(window.max(Duration::from_secs(1)));
            loop {
                ticker.tick().await;
                throttle.prune(Instant::now());
            }
        });
    }

    info!(username = %data.bot_username, "BioGuard is connecting...");

    Dispatcher::builder(bot, events::schema())
        .dependencies(dptree::deps![data])
        .default_handler(|_| async {})
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}

async fn connect_store(config: &BotConfig) -> anyhow::Result<Arc<dyn BotStore>> {
    let Some(database_url) = config.database_url.as_deref() else {
        info!("DATABASE_URL not set; warnings and settings are kept in memory.");
        return Ok(Arc::new(MemoryStore::new()));
    };

    let redis_key_prefix = config.redis_key_prefix.clone();
    let cache = if config.redis_enabled {
        match config.redis_url.as_deref() {
            Some(redis_url) => match CacheService::redis(redis_url, redis_key_prefix.clone()) {
                Ok(cache) => {
                    info!(key_prefix = %redis_key_prefix, "Redis cache enabled.");
                    cache
                }
                Err(err) => {
                    warn!(?err, key_prefix = %redis_key_prefix, "Failed to initialize Redis cache; continuing with DB-only mode.");
                    CacheService::disabled(redis_key_prefix)
                }
            },
            None => {
                warn!(key_prefix = %redis_key_prefix, "REDIS_ENABLED=true but REDIS_URL is missing; continuing with DB-only mode.");
                CacheService::disabled(redis_key_prefix)
            }
        }
    } else {
        info!("Redis cache disabled (set REDIS_ENABLED=true to enable).");
        CacheService::disabled(redis_key_prefix)
    };

    if cache.is_redis_enabled() {
        if let Err(err) = cache.ping().await {
            warn!(
                ?err,
                "Redis cache ping failed; cache operations will continue with fallback behavior."
            );
        } else {
            info!("Redis cache health check passed.");
        }
    }

    let db = Database::connect(database_url, config.database_max_connections, cache).await?;
    info!("PostgreSQL connection established.");

    if config.auto_run_migrations {
        db.migrate().await?;
        info!("Database migrations applied.");
    } else {
        info!("Auto migrations disabled (set AUTO_RUN_MIGRATIONS=true to run at startup).");
    }

    Ok(Arc::new(db))
}
