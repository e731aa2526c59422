use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::requests::Request;
use teloxide::types::{ChatPermissions, InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::{ApiError, RequestError};

use crate::platform::{ChatPlatform, PlatformError, UserProfile};
use crate::retry::RetryPolicy;

/// [`ChatPlatform`] over the Telegram Bot API; every call goes through the
/// retry policy.
#[derive(Clone, Debug)]
pub struct TelegramPlatform {
    bot: Bot,
    retry: RetryPolicy,
}

impl TelegramPlatform {
    pub fn new(bot: Bot, retry: RetryPolicy) -> Self {
        Self { bot, retry }
    }

    pub fn bot(&self) -> &Bot {
        &self.bot
    }
}

pub fn map_request_error(err: RequestError) -> PlatformError {
    match err {
        RequestError::RetryAfter(wait) => PlatformError::RateLimited {
            retry_after: wait.duration(),
        },
        RequestError::Network(source) => PlatformError::Network(source.to_string()),
        RequestError::Io(source) => PlatformError::Network(source.to_string()),
        RequestError::Api(api) => map_api_error(&api),
        other => PlatformError::Other(other.to_string()),
    }
}

fn map_api_error(api: &ApiError) -> PlatformError {
    match api {
        ApiError::MessageCantBeDeleted | ApiError::NotEnoughRightsToRestrict => {
            PlatformError::PermissionDenied(api.to_string())
        }
        ApiError::MessageToDeleteNotFound
        | ApiError::MessageToEditNotFound
        | ApiError::UserNotFound
        | ApiError::ChatNotFound => PlatformError::NotFound(api.to_string()),
        _ => classify_api_description(&api.to_string()),
    }
}

/// Descriptions meaning the bot may not act on this chat or member. Refusals
/// to act on admins count too.
const PERMISSION_MARKERS: &[&str] = &[
    "not enough rights",
    "chat_admin_required",
    "have no rights",
    "need administrator rights",
    "can't be deleted",
    "is an administrator of the chat",
    "user is an owner of the chat",
    "can't remove chat owner",
    "can't restrict self",
];

/// Fallback for API errors teloxide reports as unknown.
pub fn classify_api_description(description: &str) -> PlatformError {
    let lower = description.to_ascii_lowercase();

    if PERMISSION_MARKERS.iter().any(|marker| lower.contains(marker)) {
        PlatformError::PermissionDenied(description.to_owned())
    } else if lower.contains("not found") {
        PlatformError::NotFound(description.to_owned())
    } else {
        PlatformError::Other(description.to_owned())
    }
}

fn is_not_modified(err: &RequestError) -> bool {
    matches!(err, RequestError::Api(ApiError::MessageNotModified))
}

#[async_trait]
impl ChatPlatform for TelegramPlatform {
    async fn get_user_profile(&self, user_id: UserId) -> Result<UserProfile, PlatformError> {
        let chat = self
            .retry
            .run("get_chat", || async move {
                self.bot
                    .get_chat(ChatId::from(user_id))
                    .send()
                    .await
                    .map_err(map_request_error)
            })
            .await?;

        Ok(UserProfile {
            user_id,
            first_name: chat.first_name().unwrap_or_default().to_owned(),
            last_name: chat.last_name().map(str::to_owned),
            username: chat.username().map(str::to_owned),
            bio: chat.bio().map(str::to_owned),
        })
    }

    async fn delete_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
    ) -> Result<(), PlatformError> {
        self.retry
            .run("delete_message", || async move {
                self.bot
                    .delete_message(chat_id, message_id)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(map_request_error)
            })
            .await
    }

    async fn restrict_send(&self, chat_id: ChatId, user_id: UserId) -> Result<(), PlatformError> {
        self.retry
            .run("restrict_chat_member", || async move {
                self.bot
                    .restrict_chat_member(chat_id, user_id, ChatPermissions::empty())
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(map_request_error)
            })
            .await
    }

    async fn unrestrict_send(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> Result<(), PlatformError> {
        self.retry
            .run("restrict_chat_member", || async move {
                self.bot
                    .restrict_chat_member(chat_id, user_id, ChatPermissions::all())
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(map_request_error)
            })
            .await
    }

    async fn ban_user(&self, chat_id: ChatId, user_id: UserId) -> Result<(), PlatformError> {
        self.retry
            .run("ban_chat_member", || async move {
                self.bot
                    .ban_chat_member(chat_id, user_id)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(map_request_error)
            })
            .await
    }

    async fn unban_user(&self, chat_id: ChatId, user_id: UserId) -> Result<(), PlatformError> {
        self.retry
            .run("unban_chat_member", || async move {
                self.bot
                    .unban_chat_member(chat_id, user_id)
                    .only_if_banned(true)
                    .send()
                    .await
                    .map(|_| ())
                    .map_err(map_request_error)
            })
            .await
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<MessageId, PlatformError> {
        self.retry
            .run("send_message", || {
                let keyboard = keyboard.clone();
                async move {
                    let mut request = self
                        .bot
                        .send_message(chat_id, text)
                        .parse_mode(ParseMode::Html);
                    if let Some(keyboard) = keyboard {
                        request = request.reply_markup(keyboard);
                    }

                    request
                        .send()
                        .await
                        .map(|message| message.id)
                        .map_err(map_request_error)
                }
            })
            .await
    }

    async fn edit_message(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) -> Result<(), PlatformError> {
        self.retry
            .run("edit_message_text", || {
                let keyboard = keyboard.clone();
                async move {
                    let mut request = self
                        .bot
                        .edit_message_text(chat_id, message_id, text)
                        .parse_mode(ParseMode::Html);
                    if let Some(keyboard) = keyboard {
                        request = request.reply_markup(keyboard);
                    }

                    match request.send().await {
                        Ok(_) => Ok(()),
                        Err(err) if is_not_modified(&err) => Ok(()),
                        Err(err) => Err(map_request_error(err)),
                    }
                }
            })
            .await
    }

    async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> Result<bool, PlatformError> {
        self.retry
            .run("get_chat_member", || async move {
                self.bot
                    .get_chat_member(chat_id, user_id)
                    .send()
                    .await
                    .map(|member| member.is_privileged())
                    .map_err(map_request_error)
            })
            .await
    }

    async fn answer_callback(
        &self,
        callback_id: &str,
        text: Option<&str>,
        show_alert: bool,
    ) -> Result<(), PlatformError> {
        self.retry
            .run("answer_callback_query", || async move {
                let mut request = self.bot.answer_callback_query(callback_id.to_owned());
                if let Some(text) = text {
                    request = request.text(text).show_alert(show_alert);
                }

                request.send().await.map(|_| ()).map_err(map_request_error)
            })
            .await
    }
}
