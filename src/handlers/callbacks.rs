use teloxide::prelude::*;

use crate::callback::Callback;
use crate::dialog::{DialogEngine, Event};
use crate::handlers::{context, HandlerResult};
use crate::transport::TelegramTransport;

pub async fn callback_handler(bot: Bot, q: CallbackQuery, engine: DialogEngine) -> HandlerResult {
    if let Err(e) = bot.answer_callback_query(q.id.clone()).await {
        log::warn!("Error answering callback {}: {}", q.id, e);
    }

    let (Some(data), Some(message)) = (q.data.as_deref(), q.message.as_ref()) else {
        return Ok(());
    };

    let event = match data.parse::<Callback>() {
        Ok(callback) => Event::Button(callback),
        Err(e) => {
            log::warn!("Undecodable button from {}: {}", q.from.id, e);
            Event::InvalidButton(data.to_string())
        }
    };

    let transport = TelegramTransport::new(bot);
    let ctx = context(&transport, message.chat().id, &q.from, Some(message.id()));
    engine.handle(&ctx, event).await;

    Ok(())
}
