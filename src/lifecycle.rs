//! Временные сообщения (подсказки, меню, списки) удаляются при следующем шаге.
//! Расписание - текущий вид, он в диалоге один.

use teloxide::types::{ChatId, MessageId};

use crate::error::TransportError;
use crate::models::ConversationState;
use crate::transport::{ChatTransport, DeleteOutcome, Keyboard};

pub struct MessageLifecycle<'a> {
    transport: &'a dyn ChatTransport,
    chat_id: ChatId,
}

impl<'a> MessageLifecycle<'a> {
    pub fn new(transport: &'a dyn ChatTransport, chat_id: ChatId) -> Self {
        Self { transport, chat_id }
    }

    pub fn track_transient(&self, state: &mut ConversationState, message_id: MessageId) {
        if state.current_view_message_id == Some(message_id) {
            return;
        }
        if !state.transient_message_ids.contains(&message_id) {
            state.transient_message_ids.push(message_id);
        }
    }

    /// Удаляет все временные сообщения, кроме текущего вида
    pub async fn advance(&self, state: &mut ConversationState) {
        let current_view = state.current_view_message_id;
        for message_id in std::mem::take(&mut state.transient_message_ids) {
            if Some(message_id) == current_view {
                continue;
            }
            self.delete_quietly(message_id).await;
        }
    }

    /// Следующая подсказка или меню. `origin` редактируется, если можно,
    /// иначе отправляется новое сообщение; оно остаётся единственным временным.
    pub async fn step(
        &self,
        state: &mut ConversationState,
        origin: Option<MessageId>,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, TransportError> {
        let origin = origin.filter(|id| state.current_view_message_id != Some(*id));
        let message_id = self.edit_or_send(origin, text, keyboard).await?;

        state.transient_message_ids.retain(|id| *id != message_id);
        self.advance(state).await;
        self.track_transient(state, message_id);
        Ok(message_id)
    }

    /// Сначала удаляется прежний вид, потом показывается новый
    pub async fn replace_view(
        &self,
        state: &mut ConversationState,
        origin: Option<MessageId>,
        text: &str,
    ) -> Result<MessageId, TransportError> {
        if let Some(previous) = state.current_view_message_id.take() {
            if Some(previous) != origin {
                self.delete_quietly(previous).await;
            }
        }

        let message_id = self.edit_or_send(origin, text, None).await?;
        state.transient_message_ids.retain(|id| *id != message_id);
        state.current_view_message_id = Some(message_id);
        Ok(message_id)
    }

    pub async fn remove_incoming(&self, message_id: MessageId) {
        self.delete_quietly(message_id).await;
    }

    async fn edit_or_send(
        &self,
        origin: Option<MessageId>,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, TransportError> {
        if let Some(origin) = origin {
            match self.transport.edit(self.chat_id, origin, text, keyboard).await {
                Ok(()) => return Ok(origin),
                Err(e) => log::debug!("Edit of message {} in {} failed, sending anew: {}", origin.0, self.chat_id, e),
            }
        }
        self.transport.send(self.chat_id, text, keyboard).await
    }

    async fn delete_quietly(&self, message_id: MessageId) -> DeleteOutcome {
        let outcome = self.transport.delete(self.chat_id, message_id).await;
        match &outcome {
            DeleteOutcome::Deleted => {}
            DeleteOutcome::AlreadyAbsent => {
                log::debug!("Message {} in {} was already gone", message_id.0, self.chat_id)
            }
            DeleteOutcome::Failed(reason) => {
                log::warn!("Could not delete message {} in {}: {}", message_id.0, self.chat_id, reason)
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingTransport, Sent};

    const CHAT: ChatId = ChatId(42);

    fn state_with(transient: &[i32], view: Option<i32>) -> ConversationState {
        ConversationState {
            transient_message_ids: transient.iter().map(|id| MessageId(*id)).collect(),
            current_view_message_id: view.map(MessageId),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn advance_deletes_all_transient_messages() {
        let transport = RecordingTransport::new();
        let lifecycle = MessageLifecycle::new(&transport, CHAT);
        let mut state = state_with(&[3, 5], None);

        lifecycle.advance(&mut state).await;

        assert!(state.transient_message_ids.is_empty());
        assert_eq!(transport.deleted(), [MessageId(3), MessageId(5)]);
    }

    #[tokio::test]
    async fn advance_never_deletes_current_view() {
        let transport = RecordingTransport::new();
        let lifecycle = MessageLifecycle::new(&transport, CHAT);
        let mut state = state_with(&[3, 7], Some(7));

        lifecycle.advance(&mut state).await;

        assert_eq!(transport.deleted(), [MessageId(3)]);
        assert_eq!(state.current_view_message_id, Some(MessageId(7)));
    }

    #[tokio::test]
    async fn delete_failures_do_not_stop_the_pass() {
        let transport = RecordingTransport::new();
        transport.fail_deletes_of(MessageId(3));
        let lifecycle = MessageLifecycle::new(&transport, CHAT);
        let mut state = state_with(&[3, 4], None);

        lifecycle.advance(&mut state).await;

        assert_eq!(transport.deleted(), [MessageId(3), MessageId(4)]);
        assert!(state.transient_message_ids.is_empty());
    }

    #[tokio::test]
    async fn step_edits_origin_and_keeps_it_as_only_transient() {
        let transport = RecordingTransport::new();
        let lifecycle = MessageLifecycle::new(&transport, CHAT);
        let mut state = state_with(&[3, 10], None);

        let id = lifecycle.step(&mut state, Some(MessageId(10)), "Введите группу:", None).await.unwrap();

        assert_eq!(id, MessageId(10));
        assert_eq!(transport.deleted(), [MessageId(3)]);
        assert_eq!(state.transient_message_ids, [MessageId(10)]);
        let log = transport.sent();
        assert!(matches!(log[0], Sent::Edit { id: MessageId(10), .. }));
        assert!(!log.iter().any(|s| matches!(s, Sent::Send { .. })));
    }

    #[tokio::test]
    async fn step_falls_back_to_send_when_edit_fails() {
        let transport = RecordingTransport::new();
        transport.fail_edits();
        let lifecycle = MessageLifecycle::new(&transport, CHAT);
        let mut state = state_with(&[10], None);

        let id = lifecycle.step(&mut state, Some(MessageId(10)), "Меню", None).await.unwrap();

        assert_ne!(id, MessageId(10));
        assert_eq!(transport.deleted(), [MessageId(10)]);
        assert_eq!(state.transient_message_ids, [id]);
    }

    #[tokio::test]
    async fn replace_view_deletes_previous_view_first() {
        let transport = RecordingTransport::new();
        let lifecycle = MessageLifecycle::new(&transport, CHAT);
        let mut state = state_with(&[], Some(5));

        let id = lifecycle.replace_view(&mut state, None, "Расписание").await.unwrap();

        let log = transport.sent();
        assert!(matches!(log[0], Sent::Delete(MessageId(5))));
        assert!(matches!(log[1], Sent::Send { .. }));
        assert_eq!(state.current_view_message_id, Some(id));
    }

    #[tokio::test]
    async fn new_view_is_never_deleted_in_the_same_pass() {
        let transport = RecordingTransport::new();
        let lifecycle = MessageLifecycle::new(&transport, CHAT);
        // Нажатое меню только что было временным
        let mut state = state_with(&[8, 12], Some(5));

        let view = lifecycle.replace_view(&mut state, Some(MessageId(12)), "Расписание").await.unwrap();
        lifecycle.advance(&mut state).await;

        assert_eq!(view, MessageId(12));
        assert_eq!(transport.deleted(), [MessageId(5), MessageId(8)]);
        assert_eq!(state.current_view_message_id, Some(MessageId(12)));
    }
}
