use std::collections::HashSet;
use std::sync::Arc;

use crate::api::{ScheduleApi, SearchRecord};
use crate::database::EntityCache;
use crate::models::{Entity, EntityKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    None,
    Single(Entity),
    /// В порядке ответа сервиса, без повторов
    Many(Vec<Entity>),
}

#[derive(Clone)]
pub struct EntityResolver {
    api: Arc<dyn ScheduleApi>,
    cache: Arc<dyn EntityCache>,
}

impl EntityResolver {
    pub fn new(api: Arc<dyn ScheduleApi>, cache: Arc<dyn EntityCache>) -> Self {
        Self { api, cache }
    }

    // Ошибка сервиса = ничего не найдено
    pub async fn resolve(&self, query: &str, kind: EntityKind) -> Resolution {
        let query = query.trim();
        if query.is_empty() {
            return Resolution::None;
        }

        let records = match self.api.search(query, kind).await {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Search for {:?} ({}) failed: {}", query, kind.as_str(), e);
                return Resolution::None;
            }
        };

        let mut seen = HashSet::new();
        let mut entities = Vec::new();
        for record in records {
            let Some(id) = record.id else {
                log::debug!("Skipping search hit without id: {:?}", record.label);
                continue;
            };
            if !seen.insert(id) {
                continue;
            }
            entities.push(self.remember(id, kind, record).await);
        }

        match entities.len() {
            0 => Resolution::None,
            1 => Resolution::Single(entities.remove(0)),
            _ => Resolution::Many(entities),
        }
    }

    // Если кэш недоступен, берём запись из ответа как есть
    async fn remember(&self, id: i64, kind: EntityKind, record: SearchRecord) -> Entity {
        let label = record.label.unwrap_or_default();
        let description = record.description.filter(|d| !d.is_empty());

        match self.cache.upsert(id, kind, &label, description.as_deref()).await {
            Ok(entity) => entity,
            Err(e) => {
                log::error!("Error caching {} {}: {}", kind.as_str(), id, e);
                Entity { id, kind, label, description }
            }
        }
    }

    pub async fn cached(&self, id: i64, kind: EntityKind) -> Option<Entity> {
        match self.cache.get(id, kind).await {
            Ok(entity) => entity,
            Err(e) => {
                log::error!("Error reading cached {} {}: {}", kind.as_str(), id, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::testing::ScriptedApi;

    fn resolver(api: &Arc<ScriptedApi>, cache: &Arc<MemoryStore>) -> EntityResolver {
        EntityResolver::new(api.clone(), cache.clone())
    }

    #[tokio::test]
    async fn single_hit_is_cached() {
        let api = Arc::new(ScriptedApi::new());
        api.add_hit(EntityKind::Group, "ИВТ-211", 101, "ИВТ-211");
        let cache = Arc::new(MemoryStore::new());

        let outcome = resolver(&api, &cache).resolve("ИВТ-211", EntityKind::Group).await;

        let Resolution::Single(entity) = outcome else { panic!("expected single, got {outcome:?}") };
        assert_eq!(entity.id, 101);
        let cached = EntityCache::get(cache.as_ref(), 101, EntityKind::Group).await.unwrap();
        assert_eq!(cached, Some(entity));
    }

    #[tokio::test]
    async fn many_hits_keep_remote_order_and_drop_duplicate_ids() {
        let api = Arc::new(ScriptedApi::new());
        api.add_hit(EntityKind::Group, "ИВТ", 3, "ИВТ-213");
        api.add_hit(EntityKind::Group, "ИВТ", 1, "ИВТ-211");
        api.add_hit(EntityKind::Group, "ИВТ", 3, "ИВТ-213 (дубль)");
        api.add_hit(EntityKind::Group, "ИВТ", 2, "ИВТ-212");
        let cache = Arc::new(MemoryStore::new());

        let outcome = resolver(&api, &cache).resolve("ИВТ", EntityKind::Group).await;

        let Resolution::Many(entities) = outcome else { panic!("expected many, got {outcome:?}") };
        let ids: Vec<_> = entities.iter().map(|e| e.id).collect();
        assert_eq!(ids, [3, 1, 2]);
    }

    #[tokio::test]
    async fn transport_failure_is_none() {
        let api = Arc::new(ScriptedApi::new());
        api.fail_requests();
        let cache = Arc::new(MemoryStore::new());

        let outcome = resolver(&api, &cache).resolve("ИВТ", EntityKind::Group).await;

        assert_eq!(outcome, Resolution::None);
    }

    #[tokio::test]
    async fn blank_query_skips_the_network() {
        let api = Arc::new(ScriptedApi::new());
        let cache = Arc::new(MemoryStore::new());

        assert_eq!(resolver(&api, &cache).resolve("   ", EntityKind::Teacher).await, Resolution::None);
        assert_eq!(api.search_calls(), 0);
    }

    #[tokio::test]
    async fn later_hit_without_label_keeps_cached_label() {
        let api = Arc::new(ScriptedApi::new());
        api.add_hit(EntityKind::Teacher, "Петров", 9, "Петров П.П.");
        api.add_hit(EntityKind::Teacher, "9", 9, "");
        let cache = Arc::new(MemoryStore::new());
        let resolver = resolver(&api, &cache);

        resolver.resolve("Петров", EntityKind::Teacher).await;
        let outcome = resolver.resolve("9", EntityKind::Teacher).await;

        let Resolution::Single(entity) = outcome else { panic!("expected single, got {outcome:?}") };
        assert_eq!(entity.label, "Петров П.П.");
    }
}
