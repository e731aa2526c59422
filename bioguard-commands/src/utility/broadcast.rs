use std::collections::BTreeSet;
use std::time::Duration;

use anyhow::Context as _;
use teloxide::types::{ChatId, UserId};
use teloxide::utils::html;
use tracing::{error, info, warn};

use crate::CommandMeta;
use crate::access::is_owner;
use bioguard_core::{ChatPlatform, Data};
use bioguard_database::Registry;

pub const META: CommandMeta = CommandMeta {
    name: "broadcast",
    desc: "Send a message to every user and group the bot knows.",
    category: "owner",
    usage: "/broadcast <text>",
};

/// Gap between sends, keeping well under Telegram's global 30 msg/s cap.
pub const BROADCAST_PACING: Duration = Duration::from_millis(50);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub failed: usize,
}

/// `/broadcast <text>` from the owner in a private chat.
pub async fn broadcast_command(data: &Data, chat_id: ChatId, from: UserId, text: &str) {
    run_broadcast(data, chat_id, from, text, BROADCAST_PACING).await;
}

async fn run_broadcast(data: &Data, chat_id: ChatId, from: UserId, text: &str, pacing: Duration) {
    if !is_owner(data.owner_id, from) {
        warn!(user_id = from.0, "unauthorized broadcast attempt");
        reply(data, chat_id, "<b>❌ You are not authorized to use this command.</b>").await;
        return;
    }

    let text = text.trim();
    if text.is_empty() {
        reply(data, chat_id, &format!("Usage: <code>{}</code>", html::escape(META.usage))).await;
        return;
    }

    let targets = match collect_targets(data.store.as_ref()).await {
        Ok(targets) => targets,
        Err(source) => {
            error!(?source, "failed to load broadcast targets");
            reply(data, chat_id, "<b>🔊 Broadcast failed: could not load recipients.</b>").await;
            return;
        }
    };

    let status = data
        .platform
        .send_text(
            chat_id,
            &format!("<b>🔊 Broadcasting to {} chats...</b>", targets.len()),
            None,
        )
        .await;

    let body = html::escape(text);
    let report = deliver_all(data.platform.as_ref(), &targets, &body, pacing).await;
    info!(delivered = report.delivered, failed = report.failed, "broadcast finished");

    let summary = format!(
        "<b>🔊 Broadcast completed!</b>\nSent to {} chats successfully.\nFailed for {} chats due to errors.",
        report.delivered, report.failed
    );
    let result = match status {
        Ok(message_id) => {
            data.platform
                .edit_message(chat_id, message_id, &summary, None)
                .await
        }
        Err(_) => data.platform.send_text(chat_id, &summary, None).await.map(|_| ()),
    };
    if let Err(source) = result {
        error!(?source, chat_id = chat_id.0, "failed to report broadcast result");
    }
}

/// Every recorded user and group, deduplicated.
pub async fn collect_targets<S>(store: &S) -> anyhow::Result<Vec<ChatId>>
where
    S: Registry + ?Sized,
{
    let mut targets = BTreeSet::new();

    for user_id in store.list_user_ids().await.context("listing users")? {
        let chat_id = i64::try_from(user_id).context("user id out of range")?;
        targets.insert(chat_id);
    }
    targets.extend(store.list_group_ids().await.context("listing groups")?);

    Ok(targets.into_iter().map(ChatId).collect())
}

/// Send `text` to each target in turn. Every send already retries on rate
/// limits; what still fails is counted and skipped.
pub async fn deliver_all(
    platform: &dyn ChatPlatform,
    targets: &[ChatId],
    text: &str,
    pacing: Duration,
) -> BroadcastReport {
    let mut report = BroadcastReport::default();

    for (index, target) in targets.iter().enumerate() {
        if index > 0 && !pacing.is_zero() {
            tokio::time::sleep(pacing).await;
        }

        match platform.send_text(*target, text, None).await {
            Ok(_) => report.delivered += 1,
            Err(err) => {
                warn!(chat_id = target.0, %err, "broadcast delivery failed");
                report.failed += 1;
            }
        }
    }

    report
}

async fn reply(data: &Data, chat_id: ChatId, text: &str) {
    if let Err(source) = data.platform.send_text(chat_id, text, None).await {
        error!(?source, chat_id = chat_id.0, "failed to reply");
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use teloxide::types::{ChatId, UserId};

    use super::{BroadcastReport, collect_targets, deliver_all, run_broadcast};
    use crate::testing::{Call, fixture};
    use bioguard_core::PlatformError;
    use bioguard_database::Registry;

    #[tokio::test]
    async fn targets_cover_users_and_groups() {
        let fx = fixture();
        fx.store.record_user_seen(5).await.unwrap();
        fx.store.record_group_seen(-100).await.unwrap();
        fx.store.record_group_seen(-100).await.unwrap();

        assert_eq!(
            collect_targets(fx.store.as_ref()).await.unwrap(),
            vec![ChatId(-100), ChatId(5)]
        );
    }

    #[tokio::test]
    async fn failures_are_counted_not_fatal() {
        let fx = fixture();
        let report = deliver_all(
            fx.platform.as_ref(),
            &[ChatId(1), ChatId(2)],
            "hi",
            Duration::ZERO,
        )
        .await;
        assert_eq!(report, BroadcastReport { delivered: 2, failed: 0 });

        fx.platform
            .fail("send_text", PlatformError::PermissionDenied("bot was blocked".into()));
        let report = deliver_all(fx.platform.as_ref(), &[ChatId(1)], "hi", Duration::ZERO).await;
        assert_eq!(report, BroadcastReport { delivered: 0, failed: 1 });
    }

    #[tokio::test]
    async fn only_the_owner_may_broadcast() {
        let fx = fixture();
        fx.store.record_user_seen(5).await.unwrap();

        run_broadcast(&fx.data, ChatId(9), UserId(9), "hello", Duration::ZERO).await;
        assert_eq!(fx.platform.calls().len(), 1);
        assert!(fx.platform.texts()[0].contains("not authorized"));
    }

    #[tokio::test]
    async fn owner_broadcast_reports_counts() {
        let fx = fixture();
        fx.store.record_user_seen(5).await.unwrap();
        fx.store.record_group_seen(-100).await.unwrap();

        run_broadcast(&fx.data, ChatId(1), UserId(1), "news & updates", Duration::ZERO).await;

        let calls = fx.platform.calls();
        assert!(calls.contains(&Call::Send {
            chat_id: ChatId(5),
            text: "news &amp; updates".to_owned(),
            keyboard: None,
        }));
        assert!(fx
            .platform
            .texts()
            .last()
            .is_some_and(|text| text.contains("Sent to 2 chats successfully.")));
    }
}
