use dashmap::DashSet;
use teloxide::types::{ChatId, InlineKeyboardMarkup, MessageId, UserId};
use tracing::{debug, error, info, warn};

use crate::moderation::notices;
use bioguard_core::{ChatPlatform, Data, RecentMessages};
use bioguard_database::{BotStore, EscalationMode, GroupSettings, PunishmentKind};
use bioguard_utils::LinkDetector;

/// One group message whose author's bio is being judged.
#[derive(Clone, Copy, Debug)]
pub struct BioCheck<'a> {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub message_id: MessageId,
    /// HTML label naming the author in notices.
    pub user_label: &'a str,
    pub bio: Option<&'a str>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PunishmentOutcome {
    /// No link; any accumulated warnings were cleared.
    Clean,
    /// The triggering message could not be deleted; nothing was counted.
    MissingDeletePermission,
    Warned { count: u32, threshold: u32 },
    /// `applied` is false when the platform refused the action.
    Punished { kind: PunishmentKind, applied: bool },
    /// A store or platform failure stopped processing part way.
    Abandoned,
}

/// Decides and carries out the consequences of a bio-link violation.
///
/// Sole writer of warning counts. Increments and threshold resets go through
/// `increment_warning_count` + `compare_and_reset`, so concurrent checks for
/// the same user punish at most once per threshold crossing.
pub struct PunishmentEngine<'a> {
    store: &'a dyn BotStore,
    platform: &'a dyn ChatPlatform,
    detector: &'a LinkDetector,
    recent: &'a RecentMessages,
    delete_notices: &'a DashSet<ChatId>,
}

impl<'a> PunishmentEngine<'a> {
    pub fn new(data: &'a Data) -> Self {
        Self {
            store: data.store.as_ref(),
            platform: data.platform.as_ref(),
            detector: &data.detector,
            recent: data.recent.as_ref(),
            delete_notices: data.delete_notices.as_ref(),
        }
    }

    pub async fn handle(&self, check: &BioCheck<'_>, settings: &GroupSettings) -> PunishmentOutcome {
        let user_key = check.user_id.0;
        let chat_key = check.chat_id.0;

        if !self.detector.bio_contains_link(check.bio) {
            if let Err(source) = self.store.reset_warning_count(user_key, chat_key).await {
                error!(?source, user_id = user_key, chat_id = chat_key, "failed to clear warnings");
            }
            return PunishmentOutcome::Clean;
        }

        info!(
            user_id = user_key,
            chat_id = chat_key,
            link = ?check.bio.and_then(|bio| self.detector.first_link(bio)),
            "link found in bio"
        );

        match self
            .platform
            .delete_message(check.chat_id, check.message_id)
            .await
        {
            Ok(()) => {
                self.delete_notices.remove(&check.chat_id);
            }
            Err(err) if err.is_not_found() => {
                debug!(chat_id = chat_key, message_id = check.message_id.0, "message already gone");
            }
            Err(err) if err.is_permission_denied() => {
                warn!(chat_id = chat_key, %err, "cannot delete messages in group");
                if self.delete_notices.insert(check.chat_id) {
                    self.deliver(check.chat_id, None, notices::DELETE_PERMISSION_NOTICE, None)
                        .await;
                }
                return PunishmentOutcome::MissingDeletePermission;
            }
            Err(source) => {
                error!(?source, chat_id = chat_key, "failed to delete triggering message");
                return PunishmentOutcome::Abandoned;
            }
        }
        self.recent.forget(check.chat_id, check.message_id);

        match settings.escalation_mode {
            EscalationMode::Direct => self.punish(check, settings.punishment_kind, None).await,
            EscalationMode::Warn => self.warn(check, settings).await,
        }
    }

    async fn warn(&self, check: &BioCheck<'_>, settings: &GroupSettings) -> PunishmentOutcome {
        let user_key = check.user_id.0;
        let chat_key = check.chat_id.0;
        let threshold = settings.warning_threshold.max(1);

        let count = match self.store.increment_warning_count(user_key, chat_key).await {
            Ok(count) => count,
            Err(source) => {
                error!(?source, user_id = user_key, chat_id = chat_key, "failed to record warning");
                return PunishmentOutcome::Abandoned;
            }
        };

        let text = notices::warning_notice(check.user_label, count, threshold);
        let notice = match self.platform.send_text(check.chat_id, &text, None).await {
            Ok(message_id) => Some(message_id),
            Err(source) => {
                error!(?source, chat_id = chat_key, "failed to send warning notice");
                None
            }
        };

        if count < threshold {
            return PunishmentOutcome::Warned { count, threshold };
        }

        match self.store.compare_and_reset(user_key, chat_key, count).await {
            Ok(true) => self.punish(check, settings.punishment_kind, notice).await,
            Ok(false) => {
                debug!(user_id = user_key, chat_id = chat_key, count, "threshold crossing handled elsewhere");
                PunishmentOutcome::Warned { count, threshold }
            }
            Err(source) => {
                error!(?source, user_id = user_key, chat_id = chat_key, "failed to reset warnings");
                PunishmentOutcome::Abandoned
            }
        }
    }

    /// Apply `kind` and report it, editing `notice` when there is one.
    async fn punish(
        &self,
        check: &BioCheck<'_>,
        kind: PunishmentKind,
        notice: Option<MessageId>,
    ) -> PunishmentOutcome {
        let result = match kind {
            PunishmentKind::Mute => self.platform.restrict_send(check.chat_id, check.user_id).await,
            PunishmentKind::Ban => self.platform.ban_user(check.chat_id, check.user_id).await,
            PunishmentKind::Delete => {
                self.purge_recent(check).await;
                Ok(())
            }
        };

        let (text, keyboard, applied) = match result {
            Ok(()) => {
                info!(user_id = check.user_id.0, chat_id = check.chat_id.0, %kind, "punished user");
                (
                    notices::punishment_notice(kind, check.user_label),
                    notices::undo_keyboard(kind, check.user_id),
                    true,
                )
            }
            Err(err) if err.is_permission_denied() => {
                warn!(chat_id = check.chat_id.0, %kind, %err, "missing rights to punish");
                (notices::missing_permission_notice(kind.as_str()), None, false)
            }
            Err(err) if err.is_not_found() => {
                debug!(user_id = check.user_id.0, %kind, %err, "user no longer in group");
                return PunishmentOutcome::Punished {
                    kind,
                    applied: false,
                };
            }
            Err(source) => {
                error!(?source, user_id = check.user_id.0, chat_id = check.chat_id.0, %kind, "failed to punish user");
                return PunishmentOutcome::Abandoned;
            }
        };

        self.deliver(check.chat_id, notice, &text, keyboard).await;
        PunishmentOutcome::Punished { kind, applied }
    }

    async fn purge_recent(&self, check: &BioCheck<'_>) {
        for message_id in self.recent.authored_by(check.chat_id, check.user_id) {
            if message_id == check.message_id {
                continue;
            }

            match self.platform.delete_message(check.chat_id, message_id).await {
                Ok(()) => self.recent.forget(check.chat_id, message_id),
                Err(err) if err.is_not_found() => self.recent.forget(check.chat_id, message_id),
                Err(err) => {
                    warn!(chat_id = check.chat_id.0, message_id = message_id.0, %err, "failed to delete recent message");
                }
            }
        }
    }

    async fn deliver(
        &self,
        chat_id: ChatId,
        notice: Option<MessageId>,
        text: &str,
        keyboard: Option<InlineKeyboardMarkup>,
    ) {
        let result = match notice {
            Some(message_id) => {
                self.platform
                    .edit_message(chat_id, message_id, text, keyboard)
                    .await
            }
            None => self
                .platform
                .send_text(chat_id, text, keyboard)
                .await
                .map(|_| ()),
        };

        if let Err(source) = result {
            error!(?source, chat_id = chat_id.0, "failed to deliver moderation notice");
        }
    }
}
