use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Group,
    Teacher,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Group => "group",
            EntityKind::Teacher => "teacher",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "group" => Some(EntityKind::Group),
            "teacher" => Some(EntityKind::Teacher),
            _ => None,
        }
    }

    /// Тип поиска для сервиса расписания
    pub fn api_type(&self) -> &'static str {
        match self {
            EntityKind::Group => "group",
            EntityKind::Teacher => "person",
        }
    }
}

/// Группа или преподаватель
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: i64,
    pub kind: EntityKind,
    pub label: String,
    pub description: Option<String>,
}
