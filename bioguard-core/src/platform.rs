//! The messaging-platform seam.
//!
//! Moderation code only talks to [`ChatPlatform`]; the Telegram
//! implementation lives in [`crate::telegram`], tests use recording fakes.

use std::time::Duration;

use async_trait::async_trait;
use teloxide::types::{ChatId, InlineKeyboardMarkup, MessageId, UserId};

use bioguard_utils::formatting::format_user_label;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlatformError {
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited { retry_after: Duration },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("platform error: {0}")]
    Other(String),
}

impl PlatformError {
    /// Worth retrying after a pause.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Network(_))
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::PermissionDenied(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Public profile of a chat member, bio included.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub user_id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub bio: Option<String>,
}

impl UserProfile {
    /// HTML label used in group notices.
    pub fn label(&self) -> String {
        format_user_label(
            self.user_id.0,
            self.username.as_deref(),
            &self.first_name,
            self.last_name.as_deref(),
        )
    }
}

#[async_trait]
pub trait ChatPlatform: Send + Sync {
    async fn get_user_profile(&self, user_id: UserId) -> Result<UserProfile, PlatformError>;

    async fn get_user_bio(&self, user_id: UserId) -> Result<Option<String>, PlatformError> {
        Ok(self.get_user_profile(user_id).await?.bio)
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), PlatformError>;

    /// Revoke the user's ability to send messages until lifted.
    async fn restrict_send(&self, chat_id: ChatId, user_id: UserId) -> Result<(), PlatformError>;

    async fn unrestrict_send(&self, chat_id: ChatId, user_id: UserId)
    -> Result<(), PlatformError>;

    async fn ban_user(&self, chat_id: ChatId, user_id: UserId) -> Result<(), PlatformError>;

    /// Lift a ban; no-op when the user is not banned.
    async fn unban_user(&self, chat_id: ChatId, user_id: UserId) -> Result<(), PlatformError>;

    /// HTML text, returns the id of the sent message.
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, PlatformError>;

    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), PlatformError>;

    /// Administrator or owner of the chat right now.
    async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> Result<bool, PlatformError>;

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), PlatformError>;
}
