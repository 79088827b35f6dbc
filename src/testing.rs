//! Заглушки для тестов.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI32, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use teloxide::types::{ChatId, MessageId};

use crate::api::{ScheduleApi, SearchRecord};
use crate::dates::DateRange;
use crate::database::{ConversationRepository, ProfileStore};
use crate::error::{ApiError, StoreError, TransportError};
use crate::models::{ConversationKey, ConversationState, EntityKind, Profile, ScheduleEntry};
use crate::transport::{ChatTransport, DeleteOutcome, Keyboard};

#[derive(Debug, Clone, PartialEq)]
pub enum Sent {
    Send { id: MessageId, text: String, keyboard: Option<Keyboard> },
    Edit { id: MessageId, text: String, keyboard: Option<Keyboard> },
    Delete(MessageId),
}

impl Sent {
    pub fn text(&self) -> Option<&str> {
        match self {
            Sent::Send { text, .. } | Sent::Edit { text, .. } => Some(text),
            Sent::Delete(_) => None,
        }
    }

    pub fn keyboard(&self) -> Option<&Keyboard> {
        match self {
            Sent::Send { keyboard, .. } | Sent::Edit { keyboard, .. } => keyboard.as_ref(),
            Sent::Delete(_) => None,
        }
    }
}

/// Записывает все вызовы. Новые сообщения получают id начиная с 1000.
pub struct RecordingTransport {
    log: Mutex<Vec<Sent>>,
    next_id: AtomicI32,
    fail_edits: AtomicBool,
    failing_deletes: Mutex<Vec<MessageId>>,
    send_delay: Mutex<Option<Duration>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self {
            log: Mutex::new(Vec::new()),
            next_id: AtomicI32::new(1000),
            fail_edits: AtomicBool::new(false),
            failing_deletes: Mutex::new(Vec::new()),
            send_delay: Mutex::new(None),
        }
    }

    pub fn fail_edits(&self) {
        self.fail_edits.store(true, Ordering::SeqCst);
    }

    pub fn fail_deletes_of(&self, message_id: MessageId) {
        self.failing_deletes.lock().unwrap().push(message_id);
    }

    pub fn delay_sends(&self, delay: Duration) {
        *self.send_delay.lock().unwrap() = Some(delay);
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.log.lock().unwrap().clone()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Delete(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn last_shown(&self) -> Option<Sent> {
        self.sent().into_iter().rev().find(|s| s.text().is_some())
    }

    pub fn clear(&self) {
        self.log.lock().unwrap().clear();
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send(
        &self,
        _chat_id: ChatId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<MessageId, TransportError> {
        let delay = *self.send_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        let id = MessageId(self.next_id.fetch_add(1, Ordering::SeqCst));
        self.log.lock().unwrap().push(Sent::Send {
            id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(id)
    }

    async fn edit(
        &self,
        _chat_id: ChatId,
        message_id: MessageId,
        text: &str,
        keyboard: Option<&Keyboard>,
    ) -> Result<(), TransportError> {
        if self.fail_edits.load(Ordering::SeqCst) {
            return Err(TransportError::Rejected("message can't be edited".to_string()));
        }
        self.log.lock().unwrap().push(Sent::Edit {
            id: message_id,
            text: text.to_string(),
            keyboard: keyboard.cloned(),
        });
        Ok(())
    }

    async fn delete(&self, _chat_id: ChatId, message_id: MessageId) -> DeleteOutcome {
        self.log.lock().unwrap().push(Sent::Delete(message_id));
        if self.failing_deletes.lock().unwrap().contains(&message_id) {
            DeleteOutcome::Failed("not enough rights".to_string())
        } else {
            DeleteOutcome::Deleted
        }
    }
}

/// Сервис расписания с заготовленными ответами и счётчиками вызовов
#[derive(Default)]
pub struct ScriptedApi {
    hits: Mutex<Vec<(EntityKind, String, SearchRecord)>>,
    lessons: Mutex<HashMap<(EntityKind, i64), Vec<ScheduleEntry>>>,
    failing: AtomicBool,
    search_calls: AtomicUsize,
    schedule_calls: AtomicUsize,
    ranges: Mutex<Vec<Option<DateRange>>>,
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    // Ищется точное совпадение `term`
    pub fn add_hit(&self, kind: EntityKind, term: &str, id: i64, label: &str) {
        self.hits.lock().unwrap().push((
            kind,
            term.to_string(),
            SearchRecord {
                id: Some(id),
                label: Some(label.to_string()),
                description: None,
            },
        ));
    }

    pub fn add_lesson(&self, kind: EntityKind, id: i64, date: &str, discipline: &str) {
        self.lessons.lock().unwrap().entry((kind, id)).or_default().push(ScheduleEntry {
            date: date.to_string(),
            begin_time: "08:45".to_string(),
            discipline: discipline.to_string(),
            lecturer: "Петров П.П.".to_string(),
            room: "6-301".to_string(),
        });
    }

    pub fn fail_requests(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }

    pub fn requested_ranges(&self) -> Vec<Option<DateRange>> {
        self.ranges.lock().unwrap().clone()
    }

    fn failure() -> ApiError {
        ApiError::Status(reqwest::StatusCode::BAD_GATEWAY)
    }
}

#[async_trait]
impl ScheduleApi for ScriptedApi {
    async fn search(&self, term: &str, kind: EntityKind) -> Result<Vec<SearchRecord>, ApiError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(self
            .hits
            .lock()
            .unwrap()
            .iter()
            .filter(|(k, t, _)| *k == kind && t == term)
            .map(|(_, _, record)| record.clone())
            .collect())
    }

    async fn schedule(
        &self,
        id: i64,
        kind: EntityKind,
        range: Option<DateRange>,
    ) -> Result<Vec<ScheduleEntry>, ApiError> {
        self.schedule_calls.fetch_add(1, Ordering::SeqCst);
        self.ranges.lock().unwrap().push(range);
        if self.failing.load(Ordering::SeqCst) {
            return Err(Self::failure());
        }
        Ok(self.lessons.lock().unwrap().get(&(kind, id)).cloned().unwrap_or_default())
    }
}

/// Хранилище, у которого падает каждый запрос
pub struct BrokenStore;

impl BrokenStore {
    fn failure() -> StoreError {
        StoreError::Corrupted("database is down".to_string())
    }
}

#[async_trait]
impl ConversationRepository for BrokenStore {
    async fn load(&self, _key: ConversationKey) -> Result<Option<ConversationState>, StoreError> {
        Err(Self::failure())
    }

    async fn store(&self, _key: ConversationKey, _state: &ConversationState) -> Result<(), StoreError> {
        Err(Self::failure())
    }
}

#[async_trait]
impl ProfileStore for BrokenStore {
    async fn get(&self, _chat_id: i64) -> Result<Option<Profile>, StoreError> {
        Err(Self::failure())
    }

    async fn upsert(
        &self,
        _chat_id: i64,
        _group_id: i64,
        _display_name: Option<&str>,
    ) -> Result<Profile, StoreError> {
        Err(Self::failure())
    }
}
