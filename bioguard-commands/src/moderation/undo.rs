use teloxide::types::UserId;
use tracing::{error, info};

use crate::callbacks::{CallbackOrigin, UndoAction};
use crate::moderation::notices;
use bioguard_core::Data;
use bioguard_utils::formatting::format_user_label;

/// Lift a mute or ban from a punishment notice's button.
///
/// Callers gate this on admin status.
pub async fn handle_undo(data: &Data, origin: &CallbackOrigin<'_>, action: UndoAction) {
    let target = action.user_id();
    let result = match action {
        UndoAction::Unmute(user_id) => data.platform.unrestrict_send(origin.chat_id, user_id).await,
        UndoAction::Unban(user_id) => data.platform.unban_user(origin.chat_id, user_id).await,
    };

    let text = match result {
        Ok(()) => {
            info!(
                chat_id = origin.chat_id.0,
                user_id = target.0,
                moderator_id = origin.from.0,
                action = action.verb(),
                "punishment lifted"
            );
            notices::undo_notice(action, &target_label(data, target).await)
        }
        Err(err) if err.is_permission_denied() => notices::missing_permission_notice(action.verb()),
        Err(source) => {
            error!(?source, chat_id = origin.chat_id.0, user_id = target.0, "failed to lift punishment");
            origin.answer(data, Some("Something went wrong, try again."), true).await;
            return;
        }
    };

    if let Err(source) = data
        .platform
        .edit_message(origin.chat_id, origin.message_id, &text, None)
        .await
    {
        error!(?source, chat_id = origin.chat_id.0, "failed to edit punishment notice");
    }
    origin.answer(data, None, false).await;
}

async fn target_label(data: &Data, user_id: UserId) -> String {
    match data.platform.get_user_profile(user_id).await {
        Ok(profile) => profile.label(),
        Err(_) => format_user_label(user_id.0, None, "User", None),
    }
}

#[cfg(test)]
mod tests {
    use teloxide::types::{ChatId, MessageId, UserId};

    use super::handle_undo;
    use crate::callbacks::{CallbackOrigin, UndoAction};
    use crate::testing::{Call, fixture, profile};
    use bioguard_core::PlatformError;

    fn origin() -> CallbackOrigin<'static> {
        CallbackOrigin {
            callback_id: "cb",
            chat_id: ChatId(-100),
            message_id: MessageId(50),
            from: UserId(2),
        }
    }

    #[tokio::test]
    async fn unmute_restores_and_edits_notice() {
        let fx = fixture();
        fx.platform.add_profile(profile(42, "eve", None));

        handle_undo(&fx.data, &origin(), UndoAction::Unmute(UserId(42))).await;

        let calls = fx.platform.calls();
        assert_eq!(calls[0], Call::Unrestrict(ChatId(-100), UserId(42)));
        assert_eq!(
            calls[1],
            Call::Edit {
                chat_id: ChatId(-100),
                message_id: MessageId(50),
                text: "@eve [<code>42</code>] has been unmuted".to_owned(),
                keyboard: None,
            }
        );
    }

    #[tokio::test]
    async fn unban_without_rights_says_so() {
        let fx = fixture();
        fx.platform.fail(
            "unban_user",
            PlatformError::PermissionDenied("not enough rights".into()),
        );

        handle_undo(&fx.data, &origin(), UndoAction::Unban(UserId(42))).await;

        assert_eq!(fx.platform.texts(), vec!["I don't have permission to unban users."]);
    }
}
