use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub chat_id: i64,
    pub group_id: i64,
    pub display_name: Option<String>,
}
