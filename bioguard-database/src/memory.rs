use async_trait::async_trait;
use dashmap::{DashMap, DashSet};

use crate::model::GroupSettings;
use crate::store::{Registry, SettingsStore, WarningStore};

/// Process-local store used when no `DATABASE_URL` is configured, and in tests.
///
/// Every operation touches a single `DashMap` shard entry, so increments and
/// compare-and-reset are atomic per key.
#[derive(Debug, Default)]
pub struct MemoryStore {
    settings: DashMap<i64, GroupSettings>,
    warnings: DashMap<(u64, i64), u32>,
    users: DashSet<u64>,
    groups: DashSet<i64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SettingsStore for MemoryStore {
    async fn load_settings(&self, chat_id: i64) -> anyhow::Result<Option<GroupSettings>> {
        Ok(self.settings.get(&chat_id).map(|entry| *entry))
    }

    async fn put_settings(&self, chat_id: i64, settings: &GroupSettings) -> anyhow::Result<()> {
        settings.validate()?;
        self.settings.insert(chat_id, *settings);
        Ok(())
    }

    async fn ensure_settings(&self, chat_id: i64) -> anyhow::Result<GroupSettings> {
        Ok(*self.settings.entry(chat_id).or_default())
    }
}

#[async_trait]
impl WarningStore for MemoryStore {
    async fn get_warning_count(&self, user_id: u64, chat_id: i64) -> anyhow::Result<u32> {
        Ok(self
            .warnings
            .get(&(user_id, chat_id))
            .map_or(0, |count| *count))
    }

    async fn set_warning_count(
        &self,
        user_id: u64,
        chat_id: i64,
        count: u32,
    ) -> anyhow::Result<()> {
        self.warnings.insert((user_id, chat_id), count);
        Ok(())
    }

    async fn increment_warning_count(&self, user_id: u64, chat_id: i64) -> anyhow::Result<u32> {
        let mut count = self.warnings.entry((user_id, chat_id)).or_insert(0);
        *count = count.saturating_add(1);
        Ok(*count)
    }

    async fn compare_and_reset(
        &self,
        user_id: u64,
        chat_id: i64,
        expected: u32,
    ) -> anyhow::Result<bool> {
        match self.warnings.get_mut(&(user_id, chat_id)) {
            Some(mut count) if *count == expected => {
                *count = 0;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reset_warning_count(&self, user_id: u64, chat_id: i64) -> anyhow::Result<()> {
        self.warnings.remove(&(user_id, chat_id));
        Ok(())
    }
}

#[async_trait]
impl Registry for MemoryStore {
    async fn record_user_seen(&self, user_id: u64) -> anyhow::Result<()> {
        self.users.insert(user_id);
        Ok(())
    }

    async fn record_group_seen(&self, chat_id: i64) -> anyhow::Result<()> {
        self.groups.insert(chat_id);
        Ok(())
    }

    async fn list_user_ids(&self) -> anyhow::Result<Vec<u64>> {
        let mut ids: Vec<u64> = self.users.iter().map(|id| *id).collect();
        ids.sort_unstable();
        Ok(ids)
    }

    async fn list_group_ids(&self) -> anyhow::Result<Vec<i64>> {
        let mut ids: Vec<i64> = self.groups.iter().map(|id| *id).collect();
        ids.sort_unstable();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::MemoryStore;
    use crate::model::{EscalationMode, GroupSettings, PunishmentKind};
    use crate::store::{Registry, SettingsStore, WarningStore};

    #[tokio::test]
    async fn settings_default_until_written() {
        let store = MemoryStore::new();
        assert_eq!(store.load_settings(-1).await.unwrap(), None);
        assert_eq!(store.get_settings(-1).await, GroupSettings::default());

        let custom = GroupSettings {
            escalation_mode: EscalationMode::Direct,
            warning_threshold: 5,
            punishment_kind: PunishmentKind::Ban,
        };
        store.put_settings(-1, &custom).await.unwrap();
        assert_eq!(store.get_settings(-1).await, custom);

        // ensure_settings keeps what is already there.
        assert_eq!(store.ensure_settings(-1).await.unwrap(), custom);
        assert_eq!(
            store.ensure_settings(-2).await.unwrap(),
            GroupSettings::default()
        );
        assert!(store.load_settings(-2).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn malformed_settings_are_not_written() {
        let store = MemoryStore::new();
        let bad = GroupSettings {
            warning_threshold: 9,
            ..GroupSettings::default()
        };
        assert!(store.put_settings(-1, &bad).await.is_err());
        assert_eq!(store.load_settings(-1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn warning_counter_increments_and_resets() {
        let store = MemoryStore::new();
        assert_eq!(store.get_warning_count(1, -1).await.unwrap(), 0);
        assert_eq!(store.increment_warning_count(1, -1).await.unwrap(), 1);
        assert_eq!(store.increment_warning_count(1, -1).await.unwrap(), 2);
        assert_eq!(store.get_warning_count(1, -2).await.unwrap(), 0);

        assert!(!store.compare_and_reset(1, -1, 1).await.unwrap());
        assert!(store.compare_and_reset(1, -1, 2).await.unwrap());
        assert_eq!(store.get_warning_count(1, -1).await.unwrap(), 0);

        store.set_warning_count(1, -1, 4).await.unwrap();
        store.reset_warning_count(1, -1).await.unwrap();
        store.reset_warning_count(1, -1).await.unwrap();
        assert_eq!(store.get_warning_count(1, -1).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn concurrent_crossings_reset_exactly_once() {
        let store = Arc::new(MemoryStore::new());
        let threshold = 3;

        let mut handles = Vec::new();
        for _ in 0..threshold {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let count = store.increment_warning_count(9, -9).await.unwrap();
                count >= threshold && store.compare_and_reset(9, -9, count).await.unwrap()
            }));
        }

        let mut escalations = 0;
        for handle in handles {
            if handle.await.unwrap() {
                escalations += 1;
            }
        }

        assert_eq!(escalations, 1);
        assert_eq!(store.get_warning_count(9, -9).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn registry_lists_sorted_ids() {
        let store = MemoryStore::new();
        store.record_user_seen(5).await.unwrap();
        store.record_user_seen(2).await.unwrap();
        store.record_user_seen(5).await.unwrap();
        store.record_group_seen(-10).await.unwrap();
        store.record_group_seen(-20).await.unwrap();

        assert_eq!(store.list_user_ids().await.unwrap(), vec![2, 5]);
        assert_eq!(store.list_group_ids().await.unwrap(), vec![-20, -10]);
    }
}
