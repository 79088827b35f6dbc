use teloxide::prelude::*;

use crate::dialog::{DialogEngine, Event};
use crate::handlers::{context, HandlerResult};
use crate::transport::TelegramTransport;

pub async fn message_handler(bot: Bot, msg: Message, engine: DialogEngine) -> HandlerResult {
    let (Some(text), Some(user)) = (msg.text(), msg.from.as_ref()) else {
        return Ok(());
    };
    // Пропускаем команды - они уже обработаны в command_handler
    if text.starts_with('/') {
        return Ok(());
    }

    let transport = TelegramTransport::new(bot);
    let event = Event::Text {
        text: text.to_string(),
        message_id: msg.id,
    };
    engine
        .handle(&context(&transport, msg.chat.id, user, None), event)
        .await;

    Ok(())
}
