use serde::{Deserialize, Deserializer, Serialize};

use crate::models::ScheduleEntry;

/// Ответ `api/search`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SearchRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<i64>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Ответ `api/schedule`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LessonRecord {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(rename = "beginLesson", default)]
    pub begin_lesson: Option<String>,
    #[serde(default)]
    pub discipline: Option<String>,
    #[serde(default)]
    pub lecturer: Option<String>,
    #[serde(default)]
    pub auditorium: Option<String>,
}

impl From<LessonRecord> for ScheduleEntry {
    fn from(record: LessonRecord) -> Self {
        ScheduleEntry {
            date: record.date.unwrap_or_default(),
            begin_time: record.begin_lesson.unwrap_or_default(),
            discipline: record.discipline.unwrap_or_default(),
            lecturer: record.lecturer.unwrap_or_default(),
            room: record.auditorium.unwrap_or_default(),
        }
    }
}

// id приходит числом или строкой, остальное считаем отсутствующим
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}
