pub mod callbacks;
pub mod commands;
pub mod messages;

pub use callbacks::callback_handler;
pub use commands::command_handler;
pub use messages::message_handler;

use std::error::Error;
use std::time::Duration;

use chrono::Local;
use teloxide::types::{ChatId, MessageId, User};
use tokio::time;

use crate::bot_state::BotState;
use crate::dialog::DialogContext;
use crate::models::ConversationKey;
use crate::transport::TelegramTransport;

pub type HandlerResult = Result<(), Box<dyn Error + Send + Sync>>;

fn context<'a>(
    transport: &'a TelegramTransport,
    chat_id: ChatId,
    user: &User,
    origin: Option<MessageId>,
) -> DialogContext<'a> {
    DialogContext {
        key: ConversationKey::new(chat_id, user.id),
        transport,
        today: Local::now().date_naive(),
        user_name: user.full_name(),
        origin,
    }
}

pub async fn cache_sweep_task(state: BotState, every: Duration) {
    let mut interval = time::interval(every);

    loop {
        interval.tick().await;
        state.cleanup_cache().await;
    }
}
