use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::Row;
use teloxide::types::MessageId;

use super::{ConversationRepository, Database, EntityCache, ProfileStore};
use crate::error::StoreError;
use crate::models::{
    ConversationKey, ConversationState, DialogState, Entity, EntityKind, Profile, Selection,
};

fn entity_from_row(row: &PgRow) -> Result<Entity, StoreError> {
    let kind: String = row.get("kind");
    Ok(Entity {
        id: row.get("id"),
        kind: EntityKind::parse(&kind)
            .ok_or_else(|| StoreError::Corrupted(format!("unknown entity kind {kind:?}")))?,
        label: row.get("label"),
        description: row.get("description"),
    })
}

#[async_trait]
impl ConversationRepository for Database {
    async fn load(&self, key: ConversationKey) -> Result<Option<ConversationState>, StoreError> {
        let row = sqlx::query(
            "SELECT dialog_state, selection, transient_message_ids, current_view_message_id
             FROM conversation_states WHERE chat_id = $1 AND user_id = $2",
        )
        .bind(key.chat_id.0)
        .bind(key.user_id.0 as i64)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let dialog_state: String = row.get("dialog_state");
        let selection: Option<serde_json::Value> = row.get("selection");
        let transient: serde_json::Value = row.get("transient_message_ids");
        let current_view: Option<i32> = row.get("current_view_message_id");

        Ok(Some(ConversationState {
            dialog_state: DialogState::parse(&dialog_state)
                .ok_or_else(|| StoreError::Corrupted(format!("unknown dialog state {dialog_state:?}")))?,
            selection: selection
                .map(serde_json::from_value::<Selection>)
                .transpose()?,
            transient_message_ids: serde_json::from_value(transient)?,
            current_view_message_id: current_view.map(MessageId),
        }))
    }

    async fn store(&self, key: ConversationKey, state: &ConversationState) -> Result<(), StoreError> {
        let selection = state.selection.as_ref().map(serde_json::to_value).transpose()?;
        let transient = serde_json::to_value(&state.transient_message_ids)?;

        sqlx::query(
            r#"
            INSERT INTO conversation_states
            (chat_id, user_id, dialog_state, selection, transient_message_ids, current_view_message_id, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, NOW())
            ON CONFLICT (chat_id, user_id)
            DO UPDATE SET
                dialog_state = EXCLUDED.dialog_state,
                selection = EXCLUDED.selection,
                transient_message_ids = EXCLUDED.transient_message_ids,
                current_view_message_id = EXCLUDED.current_view_message_id,
                updated_at = NOW()
            "#,
        )
        .bind(key.chat_id.0)
        .bind(key.user_id.0 as i64)
        .bind(state.dialog_state.as_str())
        .bind(selection)
        .bind(transient)
        .bind(state.current_view_message_id.map(|id| id.0))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl ProfileStore for Database {
    async fn get(&self, chat_id: i64) -> Result<Option<Profile>, StoreError> {
        let profile = sqlx::query_as::<_, Profile>(
            "SELECT chat_id, group_id, display_name FROM profiles WHERE chat_id = $1",
        )
        .bind(chat_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(profile)
    }

    async fn upsert(
        &self,
        chat_id: i64,
        group_id: i64,
        display_name: Option<&str>,
    ) -> Result<Profile, StoreError> {
        let profile = sqlx::query_as::<_, Profile>(
            r#"
            INSERT INTO profiles (chat_id, group_id, display_name, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (chat_id)
            DO UPDATE SET
                group_id = EXCLUDED.group_id,
                display_name = EXCLUDED.display_name,
                updated_at = NOW()
            RETURNING chat_id, group_id, display_name
            "#,
        )
        .bind(chat_id)
        .bind(group_id)
        .bind(display_name)
        .fetch_one(&self.pool)
        .await?;
        Ok(profile)
    }
}

#[async_trait]
impl EntityCache for Database {
    async fn get(&self, id: i64, kind: EntityKind) -> Result<Option<Entity>, StoreError> {
        let row = sqlx::query(
            "SELECT kind, id, label, description FROM entities WHERE kind = $1 AND id = $2",
        )
        .bind(kind.as_str())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(entity_from_row).transpose()
    }

    async fn upsert(
        &self,
        id: i64,
        kind: EntityKind,
        label: &str,
        description: Option<&str>,
    ) -> Result<Entity, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO entities (kind, id, label, description, updated_at)
            VALUES ($1, $2, $3, NULLIF($4, ''), NOW())
            ON CONFLICT (kind, id)
            DO UPDATE SET
                label = COALESCE(NULLIF(EXCLUDED.label, ''), entities.label),
                description = COALESCE(EXCLUDED.description, entities.description),
                updated_at = NOW()
            RETURNING kind, id, label, description
            "#,
        )
        .bind(kind.as_str())
        .bind(id)
        .bind(label)
        .bind(description)
        .fetch_one(&self.pool)
        .await?;
        entity_from_row(&row)
    }
}
