use std::collections::VecDeque;

use dashmap::DashMap;
use teloxide::types::{ChatId, MessageId, UserId};

pub const DEFAULT_RECENT_MESSAGE_SCAN: usize = 10;

/// The last few messages seen per group, newest last.
///
/// The Bot API offers no history lookup, so the dispatcher records every
/// group message here and the `delete` punishment scans it.
#[derive(Debug)]
pub struct RecentMessages {
    depth: usize,
    chats: DashMap<ChatId, VecDeque<(MessageId, UserId)>>,
}

impl RecentMessages {
    pub fn new(depth: usize) -> Self {
        Self {
            depth,
            chats: DashMap::new(),
        }
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn record(&self, chat_id: ChatId, message_id: MessageId, author: UserId) {
        if self.depth == 0 {
            return;
        }

        let mut entry = self.chats.entry(chat_id).or_default();
        let messages = entry.value_mut();
        messages.push_back((message_id, author));
        while messages.len() > self.depth {
            messages.pop_front();
        }
    }

    /// Messages by `author` among the most recent `depth` in the chat.
    pub fn authored_by(&self, chat_id: ChatId, author: UserId) -> Vec<MessageId> {
        self.chats
            .get(&chat_id)
            .map(|messages| {
                messages
                    .iter()
                    .filter(|(_, user_id)| *user_id == author)
                    .map(|(message_id, _)| *message_id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn forget(&self, chat_id: ChatId, message_id: MessageId) {
        if let Some(mut messages) = self.chats.get_mut(&chat_id) {
            messages.retain(|(id, _)| *id != message_id);
        }
    }
}

impl Default for RecentMessages {
    fn default() -> Self {
        Self::new(DEFAULT_RECENT_MESSAGE_SCAN)
    }
}
