use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

use crate::database::ConversationRepository;
use crate::error::StoreError;
use crate::models::{ConversationKey, ConversationState};

type StateCache = Arc<RwLock<HashMap<ConversationKey, (ConversationState, Instant)>>>;
type KeyLocks = Arc<Mutex<HashMap<ConversationKey, Arc<Mutex<()>>>>>;

/// Держится всё время обработки события
pub struct ConversationGuard {
    _guard: OwnedMutexGuard<()>,
}

/// Состояния диалогов: кэш поверх хранилища и блокировки по диалогам
#[derive(Clone)]
pub struct BotState {
    repo: Arc<dyn ConversationRepository>,
    cache: StateCache,
    locks: KeyLocks,
    ttl: Duration,
}

impl BotState {
    pub fn new(repo: Arc<dyn ConversationRepository>, ttl: Duration) -> Self {
        Self {
            repo,
            cache: Arc::new(RwLock::new(HashMap::new())),
            locks: Arc::new(Mutex::new(HashMap::new())),
            ttl,
        }
    }

    pub async fn lock(&self, key: ConversationKey) -> ConversationGuard {
        let slot = {
            let mut locks = self.locks.lock().await;
            locks.entry(key).or_default().clone()
        };
        ConversationGuard {
            _guard: slot.lock_owned().await,
        }
    }

    pub async fn load(&self, key: ConversationKey) -> Result<ConversationState, StoreError> {
        {
            let cache = self.cache.read().await;
            if let Some((state, stored_at)) = cache.get(&key) {
                if stored_at.elapsed() < self.ttl {
                    return Ok(state.clone());
                }
            }
        }

        let state = self.repo.load(key).await?.unwrap_or_default();
        self.cache.write().await.insert(key, (state.clone(), Instant::now()));
        log::debug!("🎯 State loaded for {}: {:?}", key, state.dialog_state);
        Ok(state)
    }

    pub async fn save(&self, key: ConversationKey, state: ConversationState) -> Result<(), StoreError> {
        let start_time = Instant::now();
        self.repo.store(key, &state).await?;
        self.cache.write().await.insert(key, (state, Instant::now()));
        log::debug!("💾 State saved for {} in {:?}", key, start_time.elapsed());
        Ok(())
    }

    // Чистим устаревший кэш и никому не нужные блокировки
    pub async fn cleanup_cache(&self) {
        {
            let mut cache = self.cache.write().await;
            let previous_count = cache.len();
            cache.retain(|_, (_, stored_at)| stored_at.elapsed() < self.ttl);
            log::debug!("🧹 Cache cleaned: {} -> {} entries", previous_count, cache.len());
        }

        let mut locks = self.locks.lock().await;
        locks.retain(|_, slot| Arc::strong_count(slot) > 1);
    }
}
