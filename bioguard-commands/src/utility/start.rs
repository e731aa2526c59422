use reqwest::Url;
use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, UserId};
use teloxide::utils::html;
use tracing::{error, info, warn};

use crate::CommandMeta;
use bioguard_core::Data;

pub const META: CommandMeta = CommandMeta {
    name: "start",
    desc: "Introduces the bot.",
    category: "utility",
    usage: "/start",
};

pub fn welcome_text(first_name: &str) -> String {
    format!(
        "Hello {}!\n\n\
         Welcome to the Bio Link Monitor Bot! I help keep Telegram groups clean by monitoring \
         user bios for unauthorized links. Group admins can configure me to warn, mute, or ban \
         users who have links in their bios.\n\n\
         Use the buttons below to join our support group or add me to your group!",
        html::escape(first_name)
    )
}

pub fn welcome_keyboard(bot_username: &str, support_url: Option<&str>) -> InlineKeyboardMarkup {
    let mut rows = Vec::new();

    if let Some(raw) = support_url {
        match Url::parse(raw) {
            Ok(url) => rows.push(vec![InlineKeyboardButton::url("Support Group", url)]),
            Err(err) => warn!(support_url = raw, %err, "ignoring invalid support url"),
        }
    }

    match Url::parse(&format!("https://t.me/{bot_username}?startgroup=true")) {
        Ok(url) => rows.push(vec![InlineKeyboardButton::url("Add to Group", url)]),
        Err(err) => warn!(bot_username, %err, "cannot build add-to-group link"),
    }

    InlineKeyboardMarkup::new(rows)
}

/// `/start` in a private chat.
pub async fn start_command(data: &Data, chat_id: ChatId, user_id: UserId, first_name: &str) {
    if let Err(source) = data.store.record_user_seen(user_id.0).await {
        error!(?source, user_id = user_id.0, "failed to record user");
    }

    let keyboard = welcome_keyboard(&data.bot_username, data.support_url.as_deref());
    if let Err(source) = data
        .platform
        .send_text(chat_id, &welcome_text(first_name), Some(keyboard))
        .await
    {
        error!(?source, chat_id = chat_id.0, "failed to send welcome message");
    }
}

pub const GROUP_WELCOME_TEXT: &str = "Thank you for adding me! I'll monitor user bios for links. \
     Admins can configure punishments with /config.";

/// The bot was added to a group.
pub async fn bot_added_to_group(data: &Data, chat_id: ChatId) {
    if let Err(source) = data.store.record_group_seen(chat_id.0).await {
        error!(?source, chat_id = chat_id.0, "failed to record group");
    }
    match data.store.ensure_settings(chat_id.0).await {
        Ok(settings) => info!(
            chat_id = chat_id.0,
            mode = settings.escalation_mode.as_str(),
            punishment = settings.punishment_kind.as_str(),
            "joined group"
        ),
        Err(source) => error!(?source, chat_id = chat_id.0, "failed to store default settings"),
    }

    if let Err(source) = data.platform.send_text(chat_id, GROUP_WELCOME_TEXT, None).await {
        error!(?source, chat_id = chat_id.0, "failed to send group welcome");
    }
}

/// Handle a member-join service message. Returns `true` when the bot itself
/// was among the new members.
pub async fn members_joined(
    data: &Data,
    chat_id: ChatId,
    member_ids: impl IntoIterator<Item = UserId>,
) -> bool {
    if !member_ids.into_iter().any(|id| id == data.bot_id) {
        return false;
    }
    bot_added_to_group(data, chat_id).await;
    true
}
