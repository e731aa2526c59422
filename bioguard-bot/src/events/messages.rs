use teloxide::types::Message;
use tracing::{debug, info};

use crate::events::commands::dispatch_command;
use bioguard_commands::{PunishmentOutcome, check_group_message};
use bioguard_commands::utility::start::members_joined;
use bioguard_core::Data;

pub async fn handle_message(data: &Data, msg: &Message) {
    dispatch_command(data, msg).await;

    if !(msg.chat.is_group() || msg.chat.is_supergroup()) {
        return;
    }

    // The admin who added us is not judged on the join message.
    if let Some(members) = msg.new_chat_members()
        && members_joined(data, msg.chat.id, members.iter().map(|member| member.id)).await
    {
        return;
    }

    // Anonymous admins and channels post through a bot account.
    let Some(author) = msg.from.as_ref().filter(|user| !user.is_bot) else {
        return;
    };
    if msg.sender_chat.is_some() {
        return;
    }

    if let Some(outcome) = check_group_message(data, msg.chat.id, msg.id, author.id).await {
        match outcome {
            PunishmentOutcome::Clean => {
                debug!(chat_id = msg.chat.id.0, user_id = author.id.0, "bio clean");
            }
            outcome => {
                info!(chat_id = msg.chat.id.0, user_id = author.id.0, ?outcome, "bio check handled");
            }
        }
    }
}
