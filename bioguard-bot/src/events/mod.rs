pub mod callbacks;
pub mod commands;
pub mod messages;

use std::sync::Arc;

use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use bioguard_core::{Data, Error};

/// Update routing. Handlers log their own failures and never return errors
/// to the dispatcher.
pub fn schema() -> UpdateHandler<Error> {
    dptree::entry()
        .branch(Update::filter_message().endpoint(
            |msg: Message, data: Arc<Data>| async move {
                messages::handle_message(&data, &msg).await;
                Ok(())
            },
        ))
        .branch(Update::filter_callback_query().endpoint(
            |query: CallbackQuery, data: Arc<Data>| async move {
                callbacks::handle_callback_query(&data, &query).await;
                Ok(())
            },
        ))
}
