pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

use crate::error::StoreError;
use crate::models::{ConversationKey, ConversationState, Entity, EntityKind, Profile};

pub use memory::MemoryStore;

/// Хранилище состояний диалогов
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    async fn load(&self, key: ConversationKey) -> Result<Option<ConversationState>, StoreError>;
    async fn store(&self, key: ConversationKey, state: &ConversationState) -> Result<(), StoreError>;
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, chat_id: i64) -> Result<Option<Profile>, StoreError>;
    async fn upsert(
        &self,
        chat_id: i64,
        group_id: i64,
        display_name: Option<&str>,
    ) -> Result<Profile, StoreError>;
}

/// Локальная копия групп и преподавателей из поиска.
/// `upsert` не затирает непустые поля пустыми.
#[async_trait]
pub trait EntityCache: Send + Sync {
    async fn get(&self, id: i64, kind: EntityKind) -> Result<Option<Entity>, StoreError>;
    async fn upsert(
        &self,
        id: i64,
        kind: EntityKind,
        label: &str,
        description: Option<&str>,
    ) -> Result<Entity, StoreError>;
}

#[derive(Clone, Debug)]
pub struct Database {
    pub pool: PgPool,
}

impl Database {
    pub async fn new(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(1800))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        Ok(Database { pool })
    }

    pub async fn init(&self) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS conversation_states (
                chat_id BIGINT NOT NULL,
                user_id BIGINT NOT NULL,
                dialog_state TEXT NOT NULL DEFAULT 'idle',
                selection JSONB,
                transient_message_ids JSONB NOT NULL DEFAULT '[]',
                current_view_message_id INTEGER,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                PRIMARY KEY (chat_id, user_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS entities (
                kind TEXT NOT NULL,
                id BIGINT NOT NULL,
                label TEXT NOT NULL,
                description TEXT,
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                PRIMARY KEY (kind, id)
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS profiles (
                chat_id BIGINT PRIMARY KEY,
                group_id BIGINT NOT NULL,
                display_name TEXT,
                created_at TIMESTAMP WITH TIME ZONE DEFAULT NOW(),
                updated_at TIMESTAMP WITH TIME ZONE DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_entities_label ON entities (kind, label)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
