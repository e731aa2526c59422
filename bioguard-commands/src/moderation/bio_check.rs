use teloxide::types::{ChatId, MessageId, UserId};
use tracing::{debug, warn};

use crate::moderation::punishment::{BioCheck, PunishmentEngine, PunishmentOutcome};
use bioguard_core::Data;

/// Judge the author of a group message by their current bio.
///
/// Returns `None` when the check was skipped: throttled group or a profile
/// that could not be fetched.
pub async fn check_group_message(
    data: &Data,
    chat_id: ChatId,
    message_id: MessageId,
    author: UserId,
) -> Option<PunishmentOutcome> {
    data.recent.record(chat_id, message_id, author);

    if !data.throttle.allow(chat_id.0) {
        debug!(chat_id = chat_id.0, "bio check throttled");
        return None;
    }

    let profile = match data.platform.get_user_profile(author).await {
        Ok(profile) => profile,
        Err(err) => {
            warn!(user_id = author.0, chat_id = chat_id.0, %err, "failed to fetch profile");
            return None;
        }
    };

    let settings = data.store.get_settings(chat_id.0).await;
    let label = profile.label();
    let check = BioCheck {
        chat_id,
        user_id: author,
        message_id,
        user_label: &label,
        bio: profile.bio.as_deref(),
    };

    Some(PunishmentEngine::new(data).handle(&check, &settings).await)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use teloxide::types::{ChatId, MessageId, UserId};

    use super::check_group_message;
    use crate::moderation::punishment::PunishmentOutcome;
    use crate::testing::{Call, failing_fixture, fixture, profile};
    use bioguard_database::{EscalationMode, GroupSettings, PunishmentKind, SettingsStore};
    use bioguard_utils::SlidingWindowThrottle;

    const CHAT: ChatId = ChatId(-100);

    #[tokio::test]
    async fn uses_stored_group_settings() {
        let fx = fixture();
        fx.platform
            .add_profile(profile(5, "spam", Some("https://spam.example.com")));
        fx.store
            .put_settings(
                CHAT.0,
                &GroupSettings {
                    escalation_mode: EscalationMode::Direct,
                    warning_threshold: 3,
                    punishment_kind: PunishmentKind::Ban,
                },
            )
            .await
            .unwrap();

        let outcome = check_group_message(&fx.data, CHAT, MessageId(1), UserId(5)).await;
        assert_eq!(
            outcome,
            Some(PunishmentOutcome::Punished {
                kind: PunishmentKind::Ban,
                applied: true
            })
        );
    }

    #[tokio::test]
    async fn defaults_apply_without_stored_settings() {
        let fx = fixture();
        fx.platform
            .add_profile(profile(5, "spam", Some("join t.me/spamchannel")));

        let outcome = check_group_message(&fx.data, CHAT, MessageId(1), UserId(5)).await;
        assert_eq!(
            outcome,
            Some(PunishmentOutcome::Warned {
                count: 1,
                threshold: 3
            })
        );
    }

    #[tokio::test]
    async fn unknown_profile_skips_the_check() {
        let fx = fixture();
        assert_eq!(
            check_group_message(&fx.data, CHAT, MessageId(1), UserId(5)).await,
            None
        );
        assert_eq!(fx.data.recent.authored_by(CHAT, UserId(5)), vec![MessageId(1)]);
    }

    #[tokio::test]
    async fn throttled_group_is_skipped() {
        let mut fx = fixture();
        fx.data.throttle = Arc::new(SlidingWindowThrottle::new(Duration::from_secs(60), 1));
        fx.platform.add_profile(profile(5, "quiet", None));

        assert_eq!(
            check_group_message(&fx.data, CHAT, MessageId(1), UserId(5)).await,
            Some(PunishmentOutcome::Clean)
        );
        assert_eq!(
            check_group_message(&fx.data, CHAT, MessageId(2), UserId(5)).await,
            None
        );
    }

    #[tokio::test]
    async fn unreachable_store_falls_back_to_defaults_and_drops_the_warning() {
        let fx = failing_fixture();
        fx.platform
            .add_profile(profile(5, "spam", Some("join t.me/spamchannel")));

        assert_eq!(fx.store.get_settings(CHAT.0).await, GroupSettings::default());
        assert_eq!(
            check_group_message(&fx.data, CHAT, MessageId(1), UserId(5)).await,
            Some(PunishmentOutcome::Abandoned)
        );

        let calls = fx.platform.calls();
        assert_eq!(calls, vec![Call::Delete(CHAT, MessageId(1))]);
        assert!(
            calls
                .iter()
                .all(|call| !matches!(call, Call::Restrict(..) | Call::Ban(..) | Call::Send { .. }))
        );
    }
}
