//! Process-local key-value store.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;
use timeclock_core::KeyValueStore;
use timeclock_domain::Result as DomainResult;

/// Non-durable [`KeyValueStore`] for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get_item(&self, key: &str) -> DomainResult<Option<String>> {
        Ok(self.items.read().get(key).cloned())
    }

    async fn set_item(&self, key: &str, value: &str) -> DomainResult<()> {
        self.items.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove_item(&self, key: &str) -> DomainResult<()> {
        self.items.write().remove(key);
        Ok(())
    }
}
