pub mod access;
pub mod callbacks;
pub mod config;
pub mod moderation;
#[cfg(test)]
mod testing;
pub mod utility;

use teloxide::utils::command::BotCommands;

pub use callbacks::{CallbackAction, CallbackOrigin, handle_callback};
pub use moderation::{BioCheck, PunishmentEngine, PunishmentOutcome, check_group_message};

pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    utility::start::META,
    utility::help::META,
    config::settings::META,
    utility::broadcast::META,
];

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Bio link guard commands:")]
pub enum Command {
    #[command(description = "introduce the bot.")]
    Start,
    #[command(description = "list the commands.")]
    Help,
    #[command(description = "choose how users with links in their bio are handled.")]
    Config,
    #[command(description = "message every known user and group (owner only).")]
    Broadcast(String),
}
