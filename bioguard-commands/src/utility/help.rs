use teloxide::types::ChatId;
use tracing::error;

use crate::{COMMANDS, CommandMeta};
use bioguard_core::Data;

pub const META: CommandMeta = CommandMeta {
    name: "help",
    desc: "Lists out all available commands.",
    category: "utility",
    usage: "/help",
};

pub async fn help_command(data: &Data, chat_id: ChatId) {
    let text = format!(
        "<b>Available Commands</b>\n\n{}",
        grouped_help_description(&sorted_commands())
    );

    if let Err(source) = data.platform.send_text(chat_id, &text, None).await {
        error!(?source, chat_id = chat_id.0, "failed to send help");
    }
}

fn sorted_commands() -> Vec<&'static CommandMeta> {
    let mut commands: Vec<&'static CommandMeta> = COMMANDS.iter().collect();
    commands.sort_unstable_by(|left, right| {
        left.category
            .cmp(right.category)
            .then_with(|| left.name.cmp(right.name))
    });
    commands
}

pub fn grouped_help_description(commands: &[&CommandMeta]) -> String {
    let mut out = String::new();
    let mut current_category: Option<&str> = None;

    for command in commands {
        if current_category != Some(command.category) {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("<b>{}</b>\n", display_category(command.category)));
            current_category = Some(command.category);
        }

        out.push_str(&format!("<code>{}</code>: {}\n", command.usage, command.desc));
    }

    if out.is_empty() {
        out.push_str("No commands available.");
    }

    out.trim_end().to_owned()
}

fn display_category(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}
