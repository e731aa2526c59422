pub mod platform;
pub mod recent;
pub mod retry;
pub mod telegram;

use std::sync::Arc;

use dashmap::DashSet;
use teloxide::types::{ChatId, UserId};

use bioguard_database::BotStore;
use bioguard_utils::{LinkDetector, SlidingWindowThrottle};

pub use platform::{ChatPlatform, PlatformError, UserProfile};
pub use recent::RecentMessages;
pub use retry::RetryPolicy;
pub use telegram::TelegramPlatform;

pub type Error = anyhow::Error;

/// State shared by every handler.
#[derive(Clone)]
pub struct Data {
    pub store: Arc<dyn BotStore>,
    pub platform: Arc<dyn ChatPlatform>,
    pub detector: LinkDetector,
    pub throttle: Arc<SlidingWindowThrottle>,
    pub recent: Arc<RecentMessages>,
    /// Groups already told the bot cannot delete messages.
    pub delete_notices: Arc<DashSet<ChatId>>,
    pub owner_id: Option<UserId>,
    pub support_url: Option<String>,
    /// Our own account, used to spot the join that adds the bot to a group.
    pub bot_id: UserId,
    pub bot_username: String,
}
