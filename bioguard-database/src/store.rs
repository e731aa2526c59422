//! Store contracts the moderation code is written against.
//!
//! Both [`Database`] and [`crate::memory::MemoryStore`] implement them, so the
//! punishment engine never knows which one it is talking to.

use async_trait::async_trait;
use tracing::error;

use crate::database::Database;
use crate::impls::{registry, settings, warnings};
use crate::model::GroupSettings;

#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Stored settings, `None` when the group never saved any.
    async fn load_settings(&self, chat_id: i64) -> anyhow::Result<Option<GroupSettings>>;

    /// Rejects settings that fail [`GroupSettings::validate`] without writing.
    async fn put_settings(&self, chat_id: i64, settings: &GroupSettings) -> anyhow::Result<()>;

    /// Persist the defaults unless the group already has settings.
    async fn ensure_settings(&self, chat_id: i64) -> anyhow::Result<GroupSettings>;

    /// Effective settings: stored ones, or defaults when absent or when the
    /// store cannot be reached.
    async fn get_settings(&self, chat_id: i64) -> GroupSettings {
        match self.load_settings(chat_id).await {
            Ok(settings) => settings.unwrap_or_default(),
            Err(source) => {
                error!(?source, chat_id, "failed to load group settings; using defaults");
                GroupSettings::default()
            }
        }
    }
}

#[async_trait]
pub trait WarningStore: Send + Sync {
    /// `0` when no record exists.
    async fn get_warning_count(&self, user_id: u64, chat_id: i64) -> anyhow::Result<u32>;

    async fn set_warning_count(&self, user_id: u64, chat_id: i64, count: u32)
    -> anyhow::Result<()>;

    /// Atomically add one and return the new count.
    async fn increment_warning_count(&self, user_id: u64, chat_id: i64) -> anyhow::Result<u32>;

    /// Atomically reset to zero iff the count still equals `expected`.
    async fn compare_and_reset(
        &self,
        user_id: u64,
        chat_id: i64,
        expected: u32,
    ) -> anyhow::Result<bool>;

    /// Idempotent reset to zero.
    async fn reset_warning_count(&self, user_id: u64, chat_id: i64) -> anyhow::Result<()>;
}

/// Users and groups known to the bot, for broadcasts.
#[async_trait]
pub trait Registry: Send + Sync {
    async fn record_user_seen(&self, user_id: u64) -> anyhow::Result<()>;

    async fn record_group_seen(&self, chat_id: i64) -> anyhow::Result<()>;

    async fn list_user_ids(&self) -> anyhow::Result<Vec<u64>>;

    async fn list_group_ids(&self) -> anyhow::Result<Vec<i64>>;
}

/// Everything the bot persists.
pub trait BotStore: SettingsStore + WarningStore + Registry {}

impl<T> BotStore for T where T: SettingsStore + WarningStore + Registry {}

#[async_trait]
impl SettingsStore for Database {
    async fn load_settings(&self, chat_id: i64) -> anyhow::Result<Option<GroupSettings>> {
        settings::get_group_settings(self, chat_id).await
    }

    async fn put_settings(&self, chat_id: i64, settings: &GroupSettings) -> anyhow::Result<()> {
        settings::put_group_settings(self, chat_id, settings).await
    }

    async fn ensure_settings(&self, chat_id: i64) -> anyhow::Result<GroupSettings> {
        settings::ensure_group_settings(self, chat_id).await
    }
}

#[async_trait]
impl WarningStore for Database {
    async fn get_warning_count(&self, user_id: u64, chat_id: i64) -> anyhow::Result<u32> {
        warnings::get_warning_count(self, user_id, chat_id).await
    }

    async fn set_warning_count(
        &self,
        user_id: u64,
        chat_id: i64,
        count: u32,
    ) -> anyhow::Result<()> {
        warnings::set_warning_count(self, user_id, chat_id, count).await
    }

    async fn increment_warning_count(&self, user_id: u64, chat_id: i64) -> anyhow::Result<u32> {
        warnings::increment_warning_count(self, user_id, chat_id).await
    }

    async fn compare_and_reset(
        &self,
        user_id: u64,
        chat_id: i64,
        expected: u32,
    ) -> anyhow::Result<bool> {
        warnings::compare_and_reset_warning_count(self, user_id, chat_id, expected).await
    }

    async fn reset_warning_count(&self, user_id: u64, chat_id: i64) -> anyhow::Result<()> {
        warnings::reset_warning_count(self, user_id, chat_id).await
    }
}

#[async_trait]
impl Registry for Database {
    async fn record_user_seen(&self, user_id: u64) -> anyhow::Result<()> {
        registry::record_user(self, user_id).await
    }

    async fn record_group_seen(&self, chat_id: i64) -> anyhow::Result<()> {
        registry::record_group(self, chat_id).await
    }

    async fn list_user_ids(&self) -> anyhow::Result<Vec<u64>> {
        registry::list_user_ids(self).await
    }

    async fn list_group_ids(&self) -> anyhow::Result<Vec<i64>> {
        registry::list_group_ids(self).await
    }
}
