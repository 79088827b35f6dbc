use serde::{Deserialize, Serialize};
use teloxide::types::{ChatId, MessageId, UserId};

use super::EntityKind;

/// Диалог = пользователь в конкретном чате
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationKey {
    pub chat_id: ChatId,
    pub user_id: UserId,
}

impl ConversationKey {
    pub fn new(chat_id: ChatId, user_id: UserId) -> Self {
        Self { chat_id, user_id }
    }
}

impl std::fmt::Display for ConversationKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.chat_id, self.user_id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DialogState {
    #[default]
    Idle,
    AwaitGroupName,
    AwaitTeacherName,
    AwaitProfileGroup,
    /// Неделя для своей группы
    AwaitWeekDate,
    AwaitWeekDateTeacher,
    AwaitWeekDateGroup,
}

impl DialogState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DialogState::Idle => "idle",
            DialogState::AwaitGroupName => "await_group_name",
            DialogState::AwaitTeacherName => "await_teacher_name",
            DialogState::AwaitProfileGroup => "await_profile_group",
            DialogState::AwaitWeekDate => "await_week_date",
            DialogState::AwaitWeekDateTeacher => "await_week_date_teacher",
            DialogState::AwaitWeekDateGroup => "await_week_date_group",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let state = match value {
            "idle" => DialogState::Idle,
            "await_group_name" => DialogState::AwaitGroupName,
            "await_teacher_name" => DialogState::AwaitTeacherName,
            "await_profile_group" => DialogState::AwaitProfileGroup,
            "await_week_date" => DialogState::AwaitWeekDate,
            "await_week_date_teacher" => DialogState::AwaitWeekDateTeacher,
            "await_week_date_group" => DialogState::AwaitWeekDateGroup,
            _ => return None,
        };
        Some(state)
    }

    pub fn awaiting_name(kind: EntityKind) -> Self {
        match kind {
            EntityKind::Group => DialogState::AwaitGroupName,
            EntityKind::Teacher => DialogState::AwaitTeacherName,
        }
    }

    pub fn searched_kind(&self) -> Option<EntityKind> {
        match self {
            DialogState::AwaitGroupName => Some(EntityKind::Group),
            DialogState::AwaitTeacherName => Some(EntityKind::Teacher),
            _ => None,
        }
    }

    pub fn is_awaiting_week(&self) -> bool {
        matches!(
            self,
            DialogState::AwaitWeekDate
                | DialogState::AwaitWeekDateTeacher
                | DialogState::AwaitWeekDateGroup
        )
    }
}

/// Выбранная в поиске сущность
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub kind: EntityKind,
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConversationState {
    pub dialog_state: DialogState,
    pub selection: Option<Selection>,
    // Без повторов и без current_view_message_id
    pub transient_message_ids: Vec<MessageId>,
    pub current_view_message_id: Option<MessageId>,
}
