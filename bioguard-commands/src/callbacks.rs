use teloxide::types::{ChatId, MessageId, UserId};
use tracing::{debug, warn};

use crate::access::is_group_admin;
use crate::config::settings::handle_config_callback;
use crate::moderation::notices::NOT_ADMIN_ALERT;
use crate::moderation::undo::handle_undo;
use bioguard_core::Data;
use bioguard_database::{EscalationMode, PunishmentKind};

/// Inline-keyboard callback payloads.
///
/// Telegram caps callback data at 64 bytes; every encoded form stays well
/// below that.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    Config(ConfigAction),
    Undo(UndoAction),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigAction {
    Close,
    Back,
    /// Open the threshold menu.
    OpenThresholds,
    SetThreshold(u32),
    SetPunishment(PunishmentKind),
    SetMode(EscalationMode),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UndoAction {
    Unmute(UserId),
    Unban(UserId),
}

impl UndoAction {
    pub fn user_id(self) -> UserId {
        match self {
            Self::Unmute(user_id) | Self::Unban(user_id) => user_id,
        }
    }

    /// Verb used in notices, e.g. "unmute".
    pub fn verb(self) -> &'static str {
        match self {
            Self::Unmute(_) => "unmute",
            Self::Unban(_) => "unban",
        }
    }
}

impl CallbackAction {
    pub fn parse(data: &str) -> Option<Self> {
        let mut parts = data.split(':');
        let action = match (parts.next()?, parts.next()?) {
            ("cfg", "close") => Self::Config(ConfigAction::Close),
            ("cfg", "back") => Self::Config(ConfigAction::Back),
            ("cfg", "warn") => Self::Config(ConfigAction::OpenThresholds),
            ("cfg", "limit") => {
                Self::Config(ConfigAction::SetThreshold(parts.next()?.parse().ok()?))
            }
            ("cfg", "punish") => {
                Self::Config(ConfigAction::SetPunishment(PunishmentKind::parse(parts.next()?)?))
            }
            ("cfg", "mode") => {
                Self::Config(ConfigAction::SetMode(EscalationMode::parse(parts.next()?)?))
            }
            ("undo", "unmute") => Self::Undo(UndoAction::Unmute(parse_user(parts.next()?)?)),
            ("undo", "unban") => Self::Undo(UndoAction::Unban(parse_user(parts.next()?)?)),
            _ => return None,
        };

        if parts.next().is_some() {
            return None;
        }

        Some(action)
    }

    pub fn encode(&self) -> String {
        match self {
            Self::Config(ConfigAction::Close) => "cfg:close".to_owned(),
            Self::Config(ConfigAction::Back) => "cfg:back".to_owned(),
            Self::Config(ConfigAction::OpenThresholds) => "cfg:warn".to_owned(),
            Self::Config(ConfigAction::SetThreshold(threshold)) => format!("cfg:limit:{threshold}"),
            Self::Config(ConfigAction::SetPunishment(kind)) => {
                format!("cfg:punish:{}", kind.as_str())
            }
            Self::Config(ConfigAction::SetMode(mode)) => format!("cfg:mode:{}", mode.as_str()),
            Self::Undo(UndoAction::Unmute(user_id)) => format!("undo:unmute:{}", user_id.0),
            Self::Undo(UndoAction::Unban(user_id)) => format!("undo:unban:{}", user_id.0),
        }
    }
}

impl From<ConfigAction> for CallbackAction {
    fn from(action: ConfigAction) -> Self {
        Self::Config(action)
    }
}

impl From<UndoAction> for CallbackAction {
    fn from(action: UndoAction) -> Self {
        Self::Undo(action)
    }
}

/// Where a button press came from.
#[derive(Clone, Copy, Debug)]
pub struct CallbackOrigin<'a> {
    pub callback_id: &'a str,
    pub chat_id: ChatId,
    /// The message carrying the keyboard.
    pub message_id: MessageId,
    pub from: UserId,
}

impl CallbackOrigin<'_> {
    /// Acknowledge the press; failures are only logged.
    pub async fn answer(&self, data: &Data, text: Option<&str>, show_alert: bool) {
        if let Err(err) = data
            .platform
            .answer_callback(self.callback_id, text, show_alert)
            .await
        {
            warn!(callback_id = self.callback_id, %err, "failed to answer callback");
        }
    }
}

/// Route a button press. Every action is re-gated on admin status.
pub async fn handle_callback(data: &Data, origin: &CallbackOrigin<'_>, payload: &str) {
    let Some(action) = CallbackAction::parse(payload) else {
        debug!(payload, "ignoring unknown callback payload");
        origin.answer(data, None, false).await;
        return;
    };

    if !is_group_admin(data.platform.as_ref(), origin.chat_id, origin.from).await {
        origin.answer(data, Some(NOT_ADMIN_ALERT), true).await;
        return;
    }

    match action {
        CallbackAction::Config(action) => handle_config_callback(data, origin, action).await,
        CallbackAction::Undo(action) => handle_undo(data, origin, action).await,
    }
}

fn parse_user(raw: &str) -> Option<UserId> {
    raw.parse::<u64>().ok().map(UserId)
}

#[cfg(test)]
mod tests {
    use teloxide::types::{ChatId, MessageId, UserId};

    use super::{CallbackAction, CallbackOrigin, ConfigAction, UndoAction, handle_callback};
    use crate::moderation::notices::NOT_ADMIN_ALERT;
    use crate::testing::{Call, fixture};
    use bioguard_database::{EscalationMode, PunishmentKind};

    #[test]
    fn parses_config_payloads() {
        assert_eq!(
            CallbackAction::parse("cfg:limit:4"),
            Some(CallbackAction::Config(ConfigAction::SetThreshold(4)))
        );
        assert_eq!(
            CallbackAction::parse("cfg:punish:delete"),
            Some(CallbackAction::Config(ConfigAction::SetPunishment(
                PunishmentKind::Delete
            )))
        );
        assert_eq!(
            CallbackAction::parse("cfg:mode:direct"),
            Some(CallbackAction::Config(ConfigAction::SetMode(
                EscalationMode::Direct
            )))
        );
        assert_eq!(
            CallbackAction::parse("cfg:warn"),
            Some(CallbackAction::Config(ConfigAction::OpenThresholds))
        );
    }

    #[test]
    fn undo_payload_carries_the_user() {
        let action = CallbackAction::from(UndoAction::Unban(UserId(987654321)));
        assert_eq!(action.encode(), "undo:unban:987654321");
        assert_eq!(CallbackAction::parse(&action.encode()), Some(action));
    }

    #[test]
    fn rejects_garbage() {
        for data in [
            "",
            "cfg",
            "cfg:limit",
            "cfg:limit:x",
            "cfg:punish:kick",
            "undo:unmute:-1",
            "undo:unmute:1:2",
            "warn_3",
        ] {
            assert_eq!(CallbackAction::parse(data), None, "{data}");
        }
    }

    #[tokio::test]
    async fn non_admin_presses_get_an_alert() {
        let fx = fixture();
        let origin = CallbackOrigin {
            callback_id: "cb",
            chat_id: ChatId(-100),
            message_id: MessageId(9),
            from: UserId(77),
        };

        handle_callback(&fx.data, &origin, "undo:unban:42").await;

        assert_eq!(
            fx.platform.calls(),
            vec![Call::Answer {
                text: Some(NOT_ADMIN_ALERT.to_owned()),
                show_alert: true,
            }]
        );
    }
}
