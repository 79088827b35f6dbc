use async_trait::async_trait;
use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, MessageId, ParseMode};
use teloxide::{ApiError, RequestError};

use crate::callback::Callback;
use crate::error::TransportError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub text: String,
    pub callback: Callback,
}

impl Button {
    pub fn new(text: impl Into<String>, callback: Callback) -> Self {
        Self { text: text.into(), callback }
    }
}

pub type Keyboard = Vec<Vec<Button>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    AlreadyAbsent,
    Failed(String),
}

/// Отправка в чат, тексты в HTML
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, TransportError>;

    /// Тот же текст при редактировании не считается ошибкой
    async fn edit(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError>;

    async fn delete(&self, chat_id: ChatId, message_id: MessageId) -> DeleteOutcome;
}

pub fn inline_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.iter().map(|row| {
        row.iter()
            .map(|button| InlineKeyboardButton::callback(button.text.clone(), button.callback.to_string()))
            .collect::<Vec<_>>()
    }))
}

// Отказ Telegram отдельно от сетевых ошибок
fn rejection(e: RequestError) -> TransportError {
    match e {
        RequestError::Api(api) => TransportError::Rejected(api.to_string()),
        other => TransportError::Request(other),
    }
}

#[derive(Clone)]
pub struct TelegramTransport {
    bot: Bot,
}

impl TelegramTransport {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    async fn send(
        &self,
        chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, TransportError> {
        let mut request = self.bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(inline_markup(keyboard));
        }
        let message = request.await.map_err(rejection)?;
        Ok(message.id)
    }

    async fn edit(
        &self,
        chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        let mut request = self
            .bot
            .edit_message_text(chat_id, message_id, text)
            .parse_mode(ParseMode::Html);
        if let Some(keyboard) = keyboard {
            request = request.reply_markup(inline_markup(keyboard));
        }
        match request.await {
            Ok(_) | Err(RequestError::Api(ApiError::MessageNotModified)) => Ok(()),
            Err(e) => Err(rejection(e)),
        }
    }

    async fn delete(&self, chat_id: ChatId, message_id: MessageId) -> DeleteOutcome {
        match self.bot.delete_message(chat_id, message_id).await {
            Ok(_) => DeleteOutcome::Deleted,
            Err(RequestError::Api(ApiError::MessageToDeleteNotFound)) => DeleteOutcome::AlreadyAbsent,
            Err(e) => DeleteOutcome::Failed(e.to_string()),
        }
    }
}
