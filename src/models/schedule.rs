use serde::{Deserialize, Serialize};

/// Одна пара
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ScheduleEntry {
    // Обычно YYYY.MM.DD, но не всегда
    pub date: String,
    pub begin_time: String,
    pub discipline: String,
    pub lecturer: String,
    pub room: String,
}
