use teloxide::types::{ChatId, InlineKeyboardButton, InlineKeyboardMarkup, MessageId, UserId};
use tracing::{error, info, warn};

use crate::access::is_group_admin;
use crate::callbacks::{CallbackAction, CallbackOrigin, ConfigAction};
use crate::moderation::notices::NOT_ADMIN_NOTICE;
use crate::CommandMeta;
use bioguard_core::Data;
use bioguard_database::{
    ALLOWED_WARNING_THRESHOLDS, EscalationMode, GroupSettings, PunishmentKind,
};
use bioguard_utils::formatting::option_label;

pub const META: CommandMeta = CommandMeta {
    name: "config",
    desc: "Choose how users with links in their bio are handled.",
    category: "admin",
    usage: "/config",
};

const MAIN_MENU_TEXT: &str = "<b>Select punishment for users who have links in their bio:</b>";
const THRESHOLD_MENU_TEXT: &str = "<b>Select the number of warnings before punishment:</b>";

/// `/config` in a group: admins get the settings menu, everyone else a
/// refusal. The command message is removed either way.
///
/// Opening the menu registers the group and stores its defaults, same as a join.
pub async fn config_command(data: &Data, chat_id: ChatId, command_id: MessageId, from: UserId) {
    let (text, keyboard) = if is_group_admin(data.platform.as_ref(), chat_id, from).await {
        if let Err(source) = data.store.record_group_seen(chat_id.0).await {
            error!(?source, chat_id = chat_id.0, "failed to record group");
        }
        let settings = match data.store.ensure_settings(chat_id.0).await {
            Ok(settings) => settings,
            Err(source) => {
                error!(?source, chat_id = chat_id.0, "failed to store default settings");
                data.store.get_settings(chat_id.0).await
            }
        };
        (MAIN_MENU_TEXT.to_owned(), Some(main_menu(&settings)))
    } else {
        (NOT_ADMIN_NOTICE.to_owned(), None)
    };

    if let Err(source) = data.platform.send_text(chat_id, &text, keyboard).await {
        error!(?source, chat_id = chat_id.0, "failed to send config menu");
    }

    if let Err(err) = data.platform.delete_message(chat_id, command_id).await {
        warn!(chat_id = chat_id.0, %err, "failed to delete /config command");
    }
}

pub fn main_menu(settings: &GroupSettings) -> InlineKeyboardMarkup {
    let warn_selected = settings.escalation_mode == EscalationMode::Warn;
    let mode_row = vec![
        button(
            &option_label(&format!("Warn ({})", settings.warning_threshold), warn_selected),
            ConfigAction::OpenThresholds,
        ),
        button(
            &option_label("Direct", !warn_selected),
            ConfigAction::SetMode(EscalationMode::Direct),
        ),
    ];

    let punishment_row = PunishmentKind::ALL
        .iter()
        .map(|kind| {
            button(
                &option_label(kind.display_name(), settings.punishment_kind == *kind),
                ConfigAction::SetPunishment(*kind),
            )
        })
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(vec![
        mode_row,
        punishment_row,
        vec![button("Close", ConfigAction::Close)],
    ])
}

pub fn threshold_menu(settings: &GroupSettings) -> InlineKeyboardMarkup {
    let thresholds = ALLOWED_WARNING_THRESHOLDS
        .iter()
        .map(|threshold| {
            button(
                &option_label(
                    &threshold.to_string(),
                    settings.warning_threshold == *threshold,
                ),
                ConfigAction::SetThreshold(*threshold),
            )
        })
        .collect::<Vec<_>>();

    InlineKeyboardMarkup::new(vec![
        thresholds,
        vec![
            button("Back", ConfigAction::Back),
            button("Close", ConfigAction::Close),
        ],
    ])
}

fn button(label: &str, action: ConfigAction) -> InlineKeyboardButton {
    InlineKeyboardButton::callback(label.to_owned(), CallbackAction::from(action).encode())
}

/// Menu button presses. Callers gate this on admin status.
pub async fn handle_config_callback(data: &Data, origin: &CallbackOrigin<'_>, action: ConfigAction) {
    let chat_id = origin.chat_id;
    let current = data.store.get_settings(chat_id.0).await;

    let (updated, text, keyboard) = match action {
        ConfigAction::Close => {
            if let Err(err) = data.platform.delete_message(chat_id, origin.message_id).await {
                warn!(chat_id = chat_id.0, %err, "failed to close config menu");
            }
            origin.answer(data, None, false).await;
            return;
        }
        ConfigAction::Back => (None, MAIN_MENU_TEXT.to_owned(), main_menu(&current)),
        ConfigAction::OpenThresholds => {
            (None, THRESHOLD_MENU_TEXT.to_owned(), threshold_menu(&current))
        }
        ConfigAction::SetThreshold(threshold) => {
            let updated = GroupSettings {
                escalation_mode: EscalationMode::Warn,
                warning_threshold: threshold,
                ..current
            };
            (
                Some(updated),
                format!("<b>Warning limit set to {threshold}</b>"),
                threshold_menu(&updated),
            )
        }
        ConfigAction::SetPunishment(kind) => {
            let updated = GroupSettings {
                punishment_kind: kind,
                ..current
            };
            (
                Some(updated),
                "<b>Punishment selected:</b>".to_owned(),
                main_menu(&updated),
            )
        }
        ConfigAction::SetMode(mode) => {
            let updated = GroupSettings {
                escalation_mode: mode,
                ..current
            };
            (
                Some(updated),
                MAIN_MENU_TEXT.to_owned(),
                main_menu(&updated),
            )
        }
    };

    if let Some(updated) = updated {
        if let Err(source) = data.store.put_settings(chat_id.0, &updated).await {
            error!(?source, chat_id = chat_id.0, ?action, "rejected settings change");
            origin
                .answer(data, Some("Could not save settings."), true)
                .await;
            return;
        }
        info!(
            chat_id = chat_id.0,
            moderator_id = origin.from.0,
            mode = updated.escalation_mode.as_str(),
            threshold = updated.warning_threshold,
            punishment = updated.punishment_kind.as_str(),
            "group settings updated"
        );
    }

    if let Err(source) = data
        .platform
        .edit_message(chat_id, origin.message_id, &text, Some(keyboard))
        .await
    {
        error!(?source, chat_id = chat_id.0, "failed to update config menu");
    }
    origin.answer(data, None, false).await;
}
