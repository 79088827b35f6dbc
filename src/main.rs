use std::sync::Arc;

use anyhow::Context;
use teloxide::{prelude::*, utils::command::BotCommands};

mod api;
mod bot_state;
mod callback;
mod config;
mod database;
mod dates;
mod dialog;
mod error;
mod formatter;
mod handlers;
mod lifecycle;
mod models;
mod resolver;
#[cfg(test)]
mod testing;
mod transport;

use crate::api::{RaspClient, ScheduleApi};
use crate::bot_state::BotState;
use crate::config::Config;
use crate::database::{ConversationRepository, Database, EntityCache, MemoryStore, ProfileStore};
use crate::dialog::DialogEngine;
use crate::handlers::{callback_handler, command_handler, message_handler};
use crate::resolver::EntityResolver;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Доступные команды:")]
pub enum Command {
    #[command(description = "главное меню")]
    Start,
    #[command(description = "показать помощь")]
    Help,
    #[command(description = "отменить текущее действие")]
    Cancel,
}

struct Storage {
    conversations: Arc<dyn ConversationRepository>,
    profiles: Arc<dyn ProfileStore>,
    entities: Arc<dyn EntityCache>,
}

async fn open_storage(config: &Config) -> anyhow::Result<Storage> {
    let Some(database_url) = &config.database_url else {
        log::warn!("DATABASE_URL is not set, keeping everything in memory");
        let store = Arc::new(MemoryStore::new());
        return Ok(Storage {
            conversations: store.clone(),
            profiles: store.clone(),
            entities: store,
        });
    };

    let db = Database::new(database_url)
        .await
        .context("connecting to database")?;
    db.init().await.context("creating tables")?;
    log::info!("✅ Database initialized");

    let db = Arc::new(db);
    Ok(Storage {
        conversations: db.clone(),
        profiles: db.clone(),
        entities: db,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();
    log::info!("Starting schedule bot...");

    let config = Config::from_env().context("reading configuration")?;
    let storage = open_storage(&config).await?;

    let api: Arc<dyn ScheduleApi> = Arc::new(RaspClient::new(
        config.rasp_base_url.clone(),
        config.rasp_retries,
    ));
    let state = BotState::new(storage.conversations, config.state_cache_ttl);
    let resolver = EntityResolver::new(api.clone(), storage.entities);
    let engine = DialogEngine::new(state.clone(), resolver, api, storage.profiles);

    // Фоновая задача для очистки кэша
    tokio::spawn(handlers::cache_sweep_task(state, config.cache_sweep_interval));

    let bot = Bot::new(config.telegram_token);
    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        log::warn!("Error registering commands: {}", e);
    }

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .filter_command::<Command>()
                .endpoint(command_handler),
        )
        .branch(Update::filter_callback_query().endpoint(callback_handler))
        .branch(Update::filter_message().endpoint(message_handler));

    log::info!("🚀 Starting dispatcher...");

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![engine])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
