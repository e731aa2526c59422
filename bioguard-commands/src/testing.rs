//! Recording platform fake and fixtures shared by the handler tests.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use dashmap::DashSet;
use teloxide::types::{ChatId, InlineKeyboardMarkup, MessageId, UserId};

use bioguard_core::{ChatPlatform, Data, PlatformError, RecentMessages, UserProfile};
use bioguard_database::{
    BotStore, GroupSettings, MemoryStore, Registry, SettingsStore, WarningStore,
};
use bioguard_utils::{LinkDetector, SlidingWindowThrottle};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Call {
    Delete(ChatId, MessageId),
    Restrict(ChatId, UserId),
    Unrestrict(ChatId, UserId),
    Ban(ChatId, UserId),
    Unban(ChatId, UserId),
    Send {
        chat_id: ChatId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    Edit {
        chat_id: ChatId,
        message_id: MessageId,
        text: String,
        keyboard: Option<InlineKeyboardMarkup>,
    },
    Answer {
        text: Option<String>,
        show_alert: bool,
    },
}

#[derive(Default)]
pub struct FakePlatform {
    calls: Mutex<Vec<Call>>,
    failures: Mutex<HashMap<&'static str, PlatformError>>,
    admins: Mutex<HashSet<(ChatId, UserId)>>,
    profiles: Mutex<HashMap<UserId, UserProfile>>,
    next_message_id: AtomicI32,
}

impl FakePlatform {
    /// Make every call to `operation` fail with `err`.
    pub fn fail(&self, operation: &'static str, err: PlatformError) {
        self.failures.lock().unwrap().insert(operation, err);
    }

    pub fn heal(&self, operation: &'static str) {
        self.failures.lock().unwrap().remove(operation);
    }

    pub fn make_admin(&self, chat_id: ChatId, user_id: UserId) {
        self.admins.lock().unwrap().insert((chat_id, user_id));
    }

    pub fn add_profile(&self, profile: UserProfile) {
        self.profiles.lock().unwrap().insert(profile.user_id, profile);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    /// Texts of sent and edited messages, in order.
    pub fn texts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Send { text, .. } | Call::Edit { text, .. } => Some(text),
                _ => None,
            })
            .collect()
    }

    fn record(&self, operation: &'static str, call: Call) -> Result<(), PlatformError> {
        if let Some(err) = self.failures.lock().unwrap().get(operation) {
            return Err(err.clone());
        }
        self.calls.lock().unwrap().push(call);
        Ok(())
    }
}

#[async_trait]
impl ChatPlatform for FakePlatform {
    async fn get_user_profile(&self, user_id: UserId) -> Result<UserProfile, PlatformError> {
        if let Some(err) = self.failures.lock().unwrap().get("get_user_profile") {
            return Err(err.clone());
        }
        self.profiles
            .lock()
            .unwrap()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| PlatformError::NotFound(format!("user {user_id}")))
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), PlatformError> {
        self.record("delete_message", Call::Delete(chat_id, message_id))
    }

    async fn restrict_send(&self, chat_id: ChatId, user_id: UserId) -> Result<(), PlatformError> {
        self.record("restrict_send", Call::Restrict(chat_id, user_id))
    }

    async fn unrestrict_send(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<(), PlatformError> {
        self.record("unrestrict_send", Call::Unrestrict(chat_id, user_id))
    }

    async fn ban_user(&self, chat_id: ChatId, user_id: UserId) -> Result<(), PlatformError> {
        self.record("ban_user", Call::Ban(chat_id, user_id))
    }

    async fn unban_user(&self, chat_id: ChatId, user_id: UserId) -> Result<(), PlatformError> {
        self.record("unban_user", Call::Unban(chat_id, user_id))
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, PlatformError> {
        self.record(
            "send_text",
            Call::Send {
                chat_id,
                text: text.to_owned(),
                keyboard,
            },
        )?;
        Ok(MessageId(
            1000 + self.next_message_id.fetch_add(1, Ordering::SeqCst),
        ))
    }

    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), PlatformError> {
        self.record(
            "edit_message",
            Call::Edit {
                chat_id,
                message_id,
                text: text.to_owned(),
                keyboard,
            },
        )
    }

    async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> Result<bool, PlatformError> {
        if let Some(err) = self.failures.lock().unwrap().get("is_admin") {
            return Err(err.clone());
        }
        Ok(self.admins.lock().unwrap().contains(&(chat_id, user_id)))
    }

    async fn answer_callback(
        &self,
        _callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), PlatformError> {
        self.record(
            "answer_callback",
            Call::Answer {
                text: text.map(str::to_owned),
                show_alert,
            },
        )
    }
}

pub struct Fixture<S = MemoryStore> {
    pub data: Data,
    pub store: Arc<S>,
    pub platform: Arc<FakePlatform>,
}

pub const BOT_ID: UserId = UserId(999);

fn fixture_with<S: BotStore + 'static>(store: Arc<S>) -> Fixture<S> {
    let platform = Arc::new(FakePlatform::default());
    let data = Data {
        store: store.clone(),
        platform: platform.clone(),
        detector: LinkDetector::default(),
        throttle: Arc::new(SlidingWindowThrottle::default()),
        recent: Arc::new(RecentMessages::default()),
        delete_notices: Arc::new(DashSet::new()),
        owner_id: Some(UserId(1)),
        support_url: None,
        bot_id: BOT_ID,
        bot_username: "bioguard_bot".to_owned(),
    };

    Fixture {
        data,
        store,
        platform,
    }
}

pub fn fixture() -> Fixture {
    fixture_with(Arc::new(MemoryStore::new()))
}

/// Handlers wired to a store whose every call errors.
pub fn failing_fixture() -> Fixture<UnavailableStore> {
    fixture_with(Arc::new(UnavailableStore))
}

/// Store whose every call fails, as with a lost database connection.
pub struct UnavailableStore;

fn unavailable<T>() -> anyhow::Result<T> {
    Err(anyhow::anyhow!("store unavailable"))
}

#[async_trait]
impl SettingsStore for UnavailableStore {
    async fn load_settings(&self, _chat_id: i64) -> anyhow::Result<Option<GroupSettings>> {
        unavailable()
    }

    async fn put_settings(&self, _chat_id: i64, _settings: &GroupSettings) -> anyhow::Result<()> {
        unavailable()
    }

    async fn ensure_settings(&self, _chat_id: i64) -> anyhow::Result<GroupSettings> {
        unavailable()
    }
}

#[async_trait]
impl WarningStore for UnavailableStore {
    async fn get_warning_count(&self, _user_id: u64, _chat_id: i64) -> anyhow::Result<u32> {
        unavailable()
    }

    async fn set_warning_count(
        &self,
        _user_id: u64,
        _chat_id: i64,
        _count: u32,
    ) -> anyhow::Result<()> {
        unavailable()
    }

    async fn increment_warning_count(&self, _user_id: u64, _chat_id: i64) -> anyhow::Result<u32> {
        unavailable()
    }

    async fn compare_and_reset(
        &self,
        _user_id: u64,
        _chat_id: i64,
        _expected: u32,
    ) -> anyhow::Result<bool> {
        unavailable()
    }

    async fn reset_warning_count(&self, _user_id: u64, _chat_id: i64) -> anyhow::Result<()> {
        unavailable()
    }
}

#[async_trait]
impl Registry for UnavailableStore {
    async fn record_user_seen(&self, _user_id: u64) -> anyhow::Result<()> {
        unavailable()
    }

    async fn record_group_seen(&self, _chat_id: i64) -> anyhow::Result<()> {
        unavailable()
    }

    async fn list_user_ids(&self) -> anyhow::Result<Vec<u64>> {
        unavailable()
    }

    async fn list_group_ids(&self) -> anyhow::Result<Vec<i64>> {
        unavailable()
    }
}

pub fn profile(user_id: u64, username: &str, bio: Option<&str>) -> UserProfile {
    UserProfile {
        user_id: UserId(user_id),
        first_name: username.to_owned(),
        last_name: None,
        username: Some(username.to_owned()),
        bio: bio.map(str::to_owned),
    }
}
