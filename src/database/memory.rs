use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{ConversationRepository, EntityCache, ProfileStore};
use crate::error::StoreError;
use crate::models::{ConversationKey, ConversationState, Entity, EntityKind, Profile};

/// Хранилище в памяти процесса (без базы данных)
#[derive(Clone, Default)]
pub struct MemoryStore {
    conversations: Arc<RwLock<HashMap<ConversationKey, ConversationState>>>,
    profiles: Arc<RwLock<HashMap<i64, Profile>>>,
    entities: Arc<RwLock<HashMap<(EntityKind, i64), Entity>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ConversationRepository for MemoryStore {
    async fn load(&self, key: ConversationKey) -> Result<Option<ConversationState>, StoreError> {
        Ok(self.conversations.read().await.get(&key).cloned())
    }

    async fn store(&self, key: ConversationKey, state: &ConversationState) -> Result<(), StoreError> {
        self.conversations.write().await.insert(key, state.clone());
        Ok(())
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get(&self, chat_id: i64) -> Result<Option<Profile>, StoreError> {
        Ok(self.profiles.read().await.get(&chat_id).cloned())
    }

    async fn upsert(
        &self,
        chat_id: i64,
        group_id: i64,
        display_name: Option<&str>,
    ) -> Result<Profile, StoreError> {
        let profile = Profile {
            chat_id,
            group_id,
            display_name: display_name.map(str::to_string),
        };
        self.profiles.write().await.insert(chat_id, profile.clone());
        Ok(profile)
    }
}

#[async_trait]
impl EntityCache for MemoryStore {
    async fn get(&self, id: i64, kind: EntityKind) -> Result<Option<Entity>, StoreError> {
        Ok(self.entities.read().await.get(&(kind, id)).cloned())
    }

    async fn upsert(
        &self,
        id: i64,
        kind: EntityKind,
        label: &str,
        description: Option<&str>,
    ) -> Result<Entity, StoreError> {
        let description = description.filter(|d| !d.is_empty());
        let mut entities = self.entities.write().await;
        let entity = entities.entry((kind, id)).or_insert_with(|| Entity {
            id,
            kind,
            label: String::new(),
            description: None,
        });
        if !label.is_empty() {
            entity.label = label.to_string();
        }
        if let Some(description) = description {
            entity.description = Some(description.to_string());
        }
        Ok(entity.clone())
    }
}
