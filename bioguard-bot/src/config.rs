use std::env;
use std::time::Duration;

use anyhow::Context as _;
use teloxide::types::UserId;

use bioguard_core::recent::DEFAULT_RECENT_MESSAGE_SCAN;
use bioguard_core::retry::DEFAULT_RETRY_ATTEMPTS;
use bioguard_utils::throttle::{DEFAULT_BIO_CHECK_MAX_HITS, DEFAULT_BIO_CHECK_WINDOW};

/// Process configuration, read once at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BotConfig {
    pub token: String,
    /// `None` keeps all state in memory.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub auto_run_migrations: bool,
    pub redis_enabled: bool,
    pub redis_url: Option<String>,
    pub redis_key_prefix: String,
    pub owner_id: Option<UserId>,
    pub support_url: Option<String>,
    pub bio_check_window: Duration,
    pub bio_check_max_hits: u64,
    pub recent_message_scan: usize,
    pub link_match_case_insensitive: bool,
    pub api_retry_attempts: u32,
}

impl BotConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let flag = |key: &str, default: bool| var(key).map_or(default, |value| parse_bool(&value));
        let number = |key: &str, default: u64| {
            var(key)
                .and_then(|value| value.parse::<u64>().ok())
                .unwrap_or(default)
        };

        let token = var("TELOXIDE_TOKEN").context("TELOXIDE_TOKEN is not set")?;
        let owner_id = match var("OWNER_ID") {
            Some(raw) => Some(UserId(
                raw.parse::<u64>()
                    .with_context(|| format!("OWNER_ID is not a user id: {raw}"))?,
            )),
            None => None,
        };

        Ok(Self {
            token,
            database_url: var("DATABASE_URL"),
            database_max_connections: u32::try_from(number("DATABASE_MAX_CONNECTIONS", 5))
                .unwrap_or(5)
                .max(1),
            auto_run_migrations: flag("AUTO_RUN_MIGRATIONS", true),
            redis_enabled: flag("REDIS_ENABLED", false),
            redis_url: var("REDIS_URL"),
            redis_key_prefix: var("REDIS_KEY_PREFIX").unwrap_or_else(|| "bioguard:prod".to_owned()),
            owner_id,
            support_url: var("SUPPORT_URL"),
            bio_check_window: Duration::from_secs(number(
                "BIO_CHECK_WINDOW_SECONDS",
                DEFAULT_BIO_CHECK_WINDOW.as_secs(),
            )),
            bio_check_max_hits: number("BIO_CHECK_MAX_HITS", DEFAULT_BIO_CHECK_MAX_HITS),
            recent_message_scan: usize::try_from(number(
                "RECENT_MESSAGE_SCAN",
                DEFAULT_RECENT_MESSAGE_SCAN as u64,
            ))
            .unwrap_or(DEFAULT_RECENT_MESSAGE_SCAN),
            link_match_case_insensitive: flag("LINK_MATCH_CASE_INSENSITIVE", false),
            api_retry_attempts: u32::try_from(number(
                "API_RETRY_ATTEMPTS",
                u64::from(DEFAULT_RETRY_ATTEMPTS),
            ))
            .unwrap_or(DEFAULT_RETRY_ATTEMPTS),
        })
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
