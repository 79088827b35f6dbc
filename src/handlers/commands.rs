use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::dialog::{DialogEngine, Event};
use crate::handlers::{context, HandlerResult};
use crate::transport::TelegramTransport;
use crate::Command;

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    engine: DialogEngine,
) -> HandlerResult {
    let event = match cmd {
        Command::Start => Event::ShowMenu,
        Command::Cancel => Event::Cancel,
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
            return Ok(());
        }
    };

    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    let transport = TelegramTransport::new(bot);
    engine
        .handle(&context(&transport, msg.chat.id, user, None), event)
        .await;

    Ok(())
}
