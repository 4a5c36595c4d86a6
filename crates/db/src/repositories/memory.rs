use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use estimo_core::estimator::persistence::{StateStore, StoreError};

#[derive(Default)]
pub struct InMemoryStateStore {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryStateStore {
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl StateStore for InMemoryStateStore {
    async fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).cloned())
    }

    async fn save(&self, key: &str, payload: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        entries.insert(key.to_string(), payload.to_string());
        Ok(())
    }
}
