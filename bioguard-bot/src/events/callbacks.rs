use teloxide::types::CallbackQuery;
use tracing::warn;

use bioguard_commands::{CallbackOrigin, handle_callback};
use bioguard_core::Data;

pub async fn handle_callback_query(data: &Data, query: &CallbackQuery) {
    let Some(payload) = query.data.as_deref() else {
        return;
    };

    let Some(message) = query.regular_message() else {
        // Keyboard message is too old to act on.
        if let Err(err) = data.platform.answer_callback(&query.id, None, false).await {
            warn!(%err, "failed to answer stale callback");
        }
        return;
    };

    let origin = CallbackOrigin {
        callback_id: &query.id,
        chat_id: message.chat.id,
        message_id: message.id,
        from: query.from.id,
    };
    handle_callback(data, &origin, payload).await;
}
