//! Group-facing texts and keyboards for moderation notices.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, UserId};

use crate::callbacks::{CallbackAction, UndoAction};
use bioguard_database::PunishmentKind;
use bioguard_utils::formatting::format_warning_progress;

pub const DELETE_PERMISSION_NOTICE: &str = "Please grant me delete permission.";

pub const NOT_ADMIN_NOTICE: &str = "<b>❌ You are not administrator</b>";

/// Plain-text variant for callback alerts, which do not render HTML.
pub const NOT_ADMIN_ALERT: &str = "❌ You are not administrator";

pub fn warning_notice(user_label: &str, count: u32, threshold: u32) -> String {
    format!(
        "{user_label} please remove any links from your bio. Warned {}",
        format_warning_progress(count, threshold)
    )
}

pub fn punishment_notice(kind: PunishmentKind, user_label: &str) -> String {
    match kind {
        PunishmentKind::Mute => format!("{user_label} has been 🔇 muted for [ Link In Bio ]."),
        PunishmentKind::Ban => format!("{user_label} has been 🔨 banned for [ Link In Bio ]."),
        PunishmentKind::Delete => {
            format!("{user_label}'s messages are being deleted due to a link in their bio.")
        }
    }
}

pub fn missing_permission_notice(verb: &str) -> String {
    format!("I don't have permission to {verb} users.")
}

/// `None` for `delete`, which has nothing to undo.
pub fn undo_keyboard(kind: PunishmentKind, user_id: UserId) -> Option<InlineKeyboardMarkup> {
    let (label, action) = match kind {
        PunishmentKind::Mute => ("Unmute ✅", UndoAction::Unmute(user_id)),
        PunishmentKind::Ban => ("Unban ✅", UndoAction::Unban(user_id)),
        PunishmentKind::Delete => return None,
    };

    Some(InlineKeyboardMarkup::new([[InlineKeyboardButton::callback(
        label,
        CallbackAction::from(action).encode(),
    )]]))
}

pub fn undo_notice(action: UndoAction, user_label: &str) -> String {
    match action {
        UndoAction::Unmute(_) => format!("{user_label} has been unmuted"),
        UndoAction::Unban(_) => format!("{user_label} has been unbanned"),
    }
}
