use teloxide::types::Message;
use teloxide::utils::command::BotCommands;
use tracing::debug;

use bioguard_commands::Command;
use bioguard_commands::config::settings::config_command;
use bioguard_commands::utility::broadcast::broadcast_command;
use bioguard_commands::utility::help::help_command;
use bioguard_commands::utility::start::start_command;
use bioguard_core::Data;

/// Run a command if `msg` carries one addressed to this bot.
pub async fn dispatch_command(data: &Data, msg: &Message) {
    let Some(text) = msg.text() else {
        return;
    };
    if !text.starts_with(bioguard_utils::COMMAND_PREFIX) {
        return;
    }
    let Ok(command) = Command::parse(text, &data.bot_username) else {
        debug!(chat_id = msg.chat.id.0, "not one of our commands");
        return;
    };
    let Some(from) = msg.from.as_ref() else {
        return;
    };

    let private = msg.chat.is_private();
    match command {
        Command::Start if private => {
            start_command(data, msg.chat.id, from.id, &from.first_name).await;
        }
        Command::Help => help_command(data, msg.chat.id).await,
        Command::Config if !private => config_command(data, msg.chat.id, msg.id, from.id).await,
        Command::Broadcast(text) if private => {
            broadcast_command(data, msg.chat.id, from.id, &text).await;
        }
        other => debug!(?other, private, "command not available in this chat"),
    }
}
